// Copyright @yucwang 2026

use std::sync::Arc;

use crate::core::backend::{Capabilities, NoiseStrategy, NumericBackend};
use crate::core::error::FieldError;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::noise::{NoiseParams, PlanarNoise};
use crate::volumes::scalar_field::{Dimensions, ScalarField};

/// Sub-spheres drawn for an irregular region.
pub const IRREGULAR_LOBES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthesisParams {
    pub noise: NoiseParams,
    pub seed: u64,
    /// Compose the head phantom on top of the noise.
    pub anatomy: bool,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self { noise: NoiseParams::default(), seed: 0, anatomy: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feature {
    Sphere { center: Vector3f, radius: Float, density: Float },
    IrregularRegion { center: Vector3f, radius: Float, density: Float, lobes: usize },
}

/// Skull, brain, two ventricles and a lesion, scaled to the grid.
pub fn anatomical_phantom(dims: Dimensions) -> Vec<Feature> {
    let w = dims.width as Float;
    let h = dims.height as Float;
    let center = Vector3f::new((dims.width / 2) as Float,
                               (dims.height / 2) as Float,
                               (dims.depth / 2) as Float);

    vec![
        Feature::Sphere { center, radius: w * 0.35, density: 0.9 },
        Feature::Sphere { center, radius: w * 0.3, density: 0.6 },
        Feature::Sphere {
            center: center - Vector3f::new(w * 0.1, 0.0, 0.0),
            radius: w * 0.08,
            density: 0.2,
        },
        Feature::Sphere {
            center: center + Vector3f::new(w * 0.1, 0.0, 0.0),
            radius: w * 0.08,
            density: 0.2,
        },
        Feature::IrregularRegion {
            center: center + Vector3f::new(w * 0.15, h * 0.08, 0.0),
            radius: w * 0.1,
            density: 0.85,
            lobes: IRREGULAR_LOBES,
        },
    ]
}

/// Raise voxels inside the sphere to `density * (1 - dist / radius)`.
///
/// Uses `max` with the existing value, so features only ever add density.
pub fn add_sphere(field: &mut ScalarField, center: Vector3f, radius: Float, density: Float) {
    if !(radius > 0.0) {
        return;
    }
    let dims = field.dimensions();
    let lo = |c: Float| ((c - radius) as isize).max(0);
    let hi = |c: Float, n: usize| ((c + radius) as isize).min(n as isize - 1);

    let (min_x, max_x) = (lo(center.x), hi(center.x, dims.width));
    let (min_y, max_y) = (lo(center.y), hi(center.y, dims.height));
    let (min_z, max_z) = (lo(center.z), hi(center.z, dims.depth));
    if min_x > max_x || min_y > max_y || min_z > max_z {
        return;
    }

    let voxels = field.voxels_mut();
    for z in min_z..=max_z {
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let d = Vector3f::new(x as Float, y as Float, z as Float) - center;
                let dist = d.norm();
                if dist < radius {
                    let idx = x as usize + y as usize * dims.width + z as usize * dims.slice_len();
                    let falloff = 1.0 - dist / radius;
                    voxels[idx] = voxels[idx].max(density * falloff);
                }
            }
        }
    }
}

/// Cluster of `lobes` jittered spheres around `center`.
pub fn add_irregular_region(field: &mut ScalarField,
                            center: Vector3f,
                            radius: Float,
                            density: Float,
                            lobes: usize,
                            rng: &mut LcgRng) {
    let spread = radius * 0.3;
    for _ in 0..lobes {
        let offset = Vector3f::new(rng.range(-spread, spread),
                                   rng.range(-spread, spread),
                                   rng.range(-spread, spread));
        let sub_radius = rng.range(radius * 0.5, radius * 0.8);
        add_sphere(field, center + offset, sub_radius, density);
    }
}

pub fn apply_features(field: &mut ScalarField, features: &[Feature], rng: &mut LcgRng) {
    for feature in features {
        match *feature {
            Feature::Sphere { center, radius, density } => add_sphere(field, center, radius, density),
            Feature::IrregularRegion { center, radius, density, lobes } => {
                add_irregular_region(field, center, radius, density, lobes, rng)
            }
        }
    }
}

pub struct SynthesisOutcome {
    pub field: ScalarField,
    pub noise: NoiseStrategy,
    pub warnings: Vec<FieldError>,
}

pub struct FieldSynthesizer {
    params: SynthesisParams,
    noise: NoiseStrategy,
    backend: Option<Arc<dyn NumericBackend>>,
}

impl FieldSynthesizer {
    pub fn new(params: SynthesisParams,
               capabilities: &Capabilities,
               backend: Option<Arc<dyn NumericBackend>>) -> Self {
        let noise = if backend.is_some() {
            capabilities.noise
        } else {
            NoiseStrategy::PlanarApproximation
        };
        Self { params, noise, backend }
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    pub fn synthesize(&self, dims: Dimensions) -> Result<SynthesisOutcome, FieldError> {
        log::info!("Generating test volume data {}...", dims);
        let mut field = ScalarField::new(dims)?;
        let mut warnings = Vec::new();

        let mut noise = self.noise;
        if let (NoiseStrategy::Accelerated, Some(backend)) = (noise, self.backend.as_ref()) {
            if let Err(err) = backend.generate_noise_3d(field.voxels_mut(), dims, &self.params.noise) {
                log::warn!("Backend {} failed to generate noise ({}), using planar noise.", backend.name(), err);
                warnings.push(err);
                noise = NoiseStrategy::PlanarApproximation;
            }
        }
        if noise == NoiseStrategy::PlanarApproximation {
            self.fill_planar_noise(&mut field);
        }

        if self.params.anatomy {
            let mut rng = LcgRng::new(self.params.seed);
            apply_features(&mut field, &anatomical_phantom(dims), &mut rng);
        }

        Ok(SynthesisOutcome { field, noise, warnings })
    }

    fn fill_planar_noise(&self, field: &mut ScalarField) {
        let dims = field.dimensions();
        let planes = PlanarNoise::new(self.params.seed);
        let (w, h, d) = (dims.width as Float, dims.height as Float, dims.depth as Float);
        let voxels = field.voxels_mut();

        for z in 0..dims.depth {
            for y in 0..dims.height {
                for x in 0..dims.width {
                    let p = (x as Float / w, y as Float / h, z as Float / d);
                    voxels[x + y * dims.width + z * dims.slice_len()] =
                        planes.fractal_sample(p, &self.params.noise);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::NativeBackend;

    fn native() -> (Capabilities, Option<Arc<dyn NumericBackend>>) {
        let backend: Arc<dyn NumericBackend> = Arc::new(NativeBackend::new());
        (Capabilities::probe(Some(backend.as_ref())), Some(backend))
    }

    #[test]
    fn voxel_count_matches_dimensions() {
        let (caps, backend) = native();
        for dims in [Dimensions::new(1, 1, 1), Dimensions::new(5, 7, 3), Dimensions::cube(16)] {
            let synth = FieldSynthesizer::new(SynthesisParams::default(), &caps, backend.clone());
            let outcome = synth.synthesize(dims).unwrap();
            assert_eq!(outcome.field.len(), dims.width * dims.height * dims.depth);
            assert_eq!(outcome.noise, NoiseStrategy::Accelerated);
        }
    }

    #[test]
    fn planar_fallback_without_backend() {
        let caps = Capabilities::probe(None);
        let synth = FieldSynthesizer::new(SynthesisParams::default(), &caps, None);
        let outcome = synth.synthesize(Dimensions::new(6, 4, 5)).unwrap();
        assert_eq!(outcome.noise, NoiseStrategy::PlanarApproximation);
        assert_eq!(outcome.field.len(), 120);
    }

    #[test]
    fn same_seed_reproduces_field() {
        let (caps, backend) = native();
        let params = SynthesisParams { seed: 1234, ..SynthesisParams::default() };
        let a = FieldSynthesizer::new(params, &caps, backend.clone()).synthesize(Dimensions::cube(24)).unwrap();
        let b = FieldSynthesizer::new(params, &caps, backend).synthesize(Dimensions::cube(24)).unwrap();
        assert_eq!(a.field, b.field);
    }

    #[test]
    fn overlapping_spheres_take_the_max() {
        let mut field = ScalarField::new(Dimensions::cube(21)).unwrap();
        let a = Vector3f::new(10.0, 10.0, 10.0);
        let b = Vector3f::new(12.0, 10.0, 10.0);
        add_sphere(&mut field, a, 6.0, 0.6);
        add_sphere(&mut field, b, 4.0, 0.9);

        for &(x, expected) in &[(10usize, (0.6 * 1.0 as Float).max(0.9 * 0.5)),
                                (11, (0.6 * (1.0 - 1.0 / 6.0) as Float).max(0.9 * 0.75)),
                                (13, (0.6 * 0.5 as Float).max(0.9 * 0.75))] {
            let v = field.get(x, 10, 10).unwrap();
            assert!((v - expected).abs() < 1e-5, "x={} got {} expected {}", x, v, expected);
        }
    }

    #[test]
    fn sphere_order_does_not_matter() {
        let mut a = ScalarField::new(Dimensions::cube(16)).unwrap();
        let mut b = ScalarField::new(Dimensions::cube(16)).unwrap();
        let c1 = Vector3f::new(8.0, 8.0, 8.0);
        let c2 = Vector3f::new(6.0, 9.0, 7.0);
        add_sphere(&mut a, c1, 5.0, 0.6);
        add_sphere(&mut a, c2, 3.0, 0.9);
        add_sphere(&mut b, c2, 3.0, 0.9);
        add_sphere(&mut b, c1, 5.0, 0.6);
        assert_eq!(a, b);
    }

    #[test]
    fn sphere_never_lowers_density() {
        let mut field = ScalarField::from_voxels(Dimensions::cube(8), vec![0.95; 512]).unwrap();
        add_sphere(&mut field, Vector3f::new(4.0, 4.0, 4.0), 3.0, 0.2);
        assert!(field.voxels().iter().all(|&v| v == 0.95));
    }

    #[test]
    fn sphere_outside_grid_is_clipped() {
        let mut field = ScalarField::new(Dimensions::cube(8)).unwrap();
        add_sphere(&mut field, Vector3f::new(-2.0, 0.0, 0.0), 3.0, 1.0);
        assert!(field.get(0, 0, 0).unwrap() > 0.0);
        add_sphere(&mut field, Vector3f::new(40.0, 40.0, 40.0), 3.0, 1.0);
        assert_eq!(field.get(7, 7, 7).unwrap(), 0.0);
    }

    #[test]
    fn irregular_region_is_seeded() {
        let center = Vector3f::new(10.0, 10.0, 10.0);
        let mut a = ScalarField::new(Dimensions::cube(20)).unwrap();
        let mut b = ScalarField::new(Dimensions::cube(20)).unwrap();
        add_irregular_region(&mut a, center, 5.0, 0.85, IRREGULAR_LOBES, &mut LcgRng::new(9));
        add_irregular_region(&mut b, center, 5.0, 0.85, IRREGULAR_LOBES, &mut LcgRng::new(9));
        assert_eq!(a, b);

        let peak = a.voxels().iter().cloned().fold(0.0, Float::max);
        assert!(peak > 0.0 && peak <= 0.85);
        // lobes reach at most 0.3r per axis plus 0.8r from the center
        assert_eq!(a.get(0, 0, 0).unwrap(), 0.0);
        assert_eq!(a.get(19, 19, 19).unwrap(), 0.0);
    }

    #[test]
    fn phantom_layout() {
        let features = anatomical_phantom(Dimensions::cube(100));
        assert_eq!(features.len(), 5);
        match features[0] {
            Feature::Sphere { center, radius, density } => {
                assert_eq!(center, Vector3f::new(50.0, 50.0, 50.0));
                assert!((radius - 35.0).abs() < 1e-4);
                assert_eq!(density, 0.9);
            }
            _ => panic!("skull should be a sphere"),
        }
        assert!(matches!(features[4], Feature::IrregularRegion { lobes: IRREGULAR_LOBES, .. }));
    }
}
