// Copyright @yucwang 2026

use indicatif::{ProgressBar, ProgressStyle};
use std::thread;

use crate::core::error::FieldError;
use crate::math::constants::Float;
use crate::volumes::noise::{fractal_value_noise, NoiseParams};
use crate::volumes::processor;
use crate::volumes::scalar_field::Dimensions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    CoherentNoise,
    GaussianBlur,
    Histogram,
    Threshold,
}

/// Optional numeric accelerator.
///
/// Histogram and threshold have native reference implementations, so only noise and
/// blur are allowed to be missing.
pub trait NumericBackend: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, capability: Capability) -> bool;

    fn generate_noise_3d(&self,
                         _out: &mut [Float],
                         _dims: Dimensions,
                         _params: &NoiseParams) -> Result<(), FieldError> {
        Err(FieldError::AcceleratorUnavailable(Capability::CoherentNoise))
    }

    fn gaussian_blur_3d(&self,
                        _input: &[Float],
                        _output: &mut [Float],
                        _dims: Dimensions,
                        _sigma: Float) -> Result<(), FieldError> {
        Err(FieldError::AcceleratorUnavailable(Capability::GaussianBlur))
    }

    fn histogram(&self, data: &[Float], bins: usize, min: Float, max: Float) -> Vec<u32> {
        processor::histogram(data, bins, min, max)
    }

    fn threshold_mask(&self, data: &[Float], min: Float, max: Float) -> Vec<u8> {
        processor::threshold_mask(data, min, max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseStrategy {
    Accelerated,
    /// Three averaged 2D planes; lower quality than true 3D noise.
    PlanarApproximation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothingStrategy {
    Accelerated,
    /// No blur available; the pass is skipped and reported.
    Disabled,
}

/// Strategies chosen once from what the backend offers.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
    pub backend_name: Option<String>,
    pub noise: NoiseStrategy,
    pub smoothing: SmoothingStrategy,
}

impl Capabilities {
    pub fn probe(backend: Option<&dyn NumericBackend>) -> Self {
        let caps = match backend {
            Some(b) => Self {
                backend_name: Some(b.name().to_string()),
                noise: if b.supports(Capability::CoherentNoise) {
                    NoiseStrategy::Accelerated
                } else {
                    NoiseStrategy::PlanarApproximation
                },
                smoothing: if b.supports(Capability::GaussianBlur) {
                    SmoothingStrategy::Accelerated
                } else {
                    SmoothingStrategy::Disabled
                },
            },
            None => Self {
                backend_name: None,
                noise: NoiseStrategy::PlanarApproximation,
                smoothing: SmoothingStrategy::Disabled,
            },
        };

        if caps.noise == NoiseStrategy::PlanarApproximation {
            log::warn!("3D noise unavailable, synthesis will use the planar approximation.");
        }
        if caps.smoothing == SmoothingStrategy::Disabled {
            log::warn!("Gaussian blur unavailable, smoothing passes will be skipped.");
        }
        log::info!("Numeric backend: {}, noise: {:?}, smoothing: {:?}.",
                   caps.backend_name.as_deref().unwrap_or("none"), caps.noise, caps.smoothing);
        caps
    }

    pub fn is_degraded(&self) -> bool {
        self.noise != NoiseStrategy::Accelerated || self.smoothing != SmoothingStrategy::Accelerated
    }
}

/// Normalized Gaussian weights covering +-3 sigma, at least 3 taps.
pub fn gaussian_kernel(sigma: Float) -> Vec<Float> {
    let mut size = (sigma * 3.0) as usize * 2 + 1;
    if size < 3 {
        size = 3;
    }
    let half = (size / 2) as isize;

    let mut kernel: Vec<Float> = (0..size)
        .map(|i| {
            let x = (i as isize - half) as Float;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: Float = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

/// CPU backend splitting work into z-slabs across scoped threads.
///
/// Each slice is computed independently, so the output does not depend on the
/// thread count.
pub struct NativeBackend {
    threads: usize,
    show_progress: bool,
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend {
    pub fn new() -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self { threads, show_progress: false }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: usize, label: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {msg} {bar:40.cyan/blue} {pos}/{len} slices")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message(label);
        progress
    }

    /// Run `f(z, slice)` for every z-slice of `out`.
    fn for_each_slice<F>(&self, out: &mut [Float], dims: Dimensions, label: &'static str, f: F)
    where
        F: Fn(usize, &mut [Float]) + Sync,
    {
        let slice_len = dims.slice_len();
        let threads = self.threads.max(1).min(dims.depth.max(1));
        let slices_per_slab = (dims.depth + threads - 1) / threads;
        let progress = self.progress_bar(dims.depth, label);

        thread::scope(|scope| {
            for (slab_index, slab) in out.chunks_mut(slices_per_slab * slice_len).enumerate() {
                let f = &f;
                let progress = &progress;
                scope.spawn(move || {
                    for (k, slice) in slab.chunks_mut(slice_len).enumerate() {
                        f(slab_index * slices_per_slab + k, slice);
                        progress.inc(1);
                    }
                });
            }
        });
        progress.finish_and_clear();
    }
}

fn check_len(len: usize, dims: Dimensions) -> Result<(), FieldError> {
    let expected = dims.voxel_count()?;
    if len != expected {
        return Err(FieldError::DimensionMismatch { expected, actual: len });
    }
    Ok(())
}

impl NumericBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    fn generate_noise_3d(&self,
                         out: &mut [Float],
                         dims: Dimensions,
                         params: &NoiseParams) -> Result<(), FieldError> {
        check_len(out.len(), dims)?;
        let (w, h, d) = (dims.width as Float, dims.height as Float, dims.depth as Float);

        self.for_each_slice(out, dims, "noise", |z, slice| {
            for y in 0..dims.height {
                for x in 0..dims.width {
                    let p = (x as Float / w, y as Float / h, z as Float / d);
                    slice[x + y * dims.width] = fractal_value_noise(p, params);
                }
            }
        });
        Ok(())
    }

    fn gaussian_blur_3d(&self,
                        input: &[Float],
                        output: &mut [Float],
                        dims: Dimensions,
                        sigma: Float) -> Result<(), FieldError> {
        check_len(input.len(), dims)?;
        check_len(output.len(), dims)?;
        if sigma <= 0.0 {
            output.copy_from_slice(input);
            return Ok(());
        }

        let kernel = gaussian_kernel(sigma);
        let half = (kernel.len() / 2) as isize;
        let (w, h, d) = (dims.width, dims.height, dims.depth);
        let slice_len = dims.slice_len();
        let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

        let mut along_x = vec![0.0; input.len()];
        self.for_each_slice(&mut along_x, dims, "blur x", |z, slice| {
            let src = &input[z * slice_len..(z + 1) * slice_len];
            for y in 0..h {
                for x in 0..w {
                    let mut value = 0.0;
                    for (k, weight) in kernel.iter().enumerate() {
                        let sx = clamp(x as isize + k as isize - half, w);
                        value += src[sx + y * w] * weight;
                    }
                    slice[x + y * w] = value;
                }
            }
        });

        let mut along_y = vec![0.0; input.len()];
        self.for_each_slice(&mut along_y, dims, "blur y", |z, slice| {
            let src = &along_x[z * slice_len..(z + 1) * slice_len];
            for y in 0..h {
                for x in 0..w {
                    let mut value = 0.0;
                    for (k, weight) in kernel.iter().enumerate() {
                        let sy = clamp(y as isize + k as isize - half, h);
                        value += src[x + sy * w] * weight;
                    }
                    slice[x + y * w] = value;
                }
            }
        });

        self.for_each_slice(output, dims, "blur z", |z, slice| {
            for (k, weight) in kernel.iter().enumerate() {
                let sz = clamp(z as isize + k as isize - half, d);
                let src = &along_y[sz * slice_len..(sz + 1) * slice_len];
                if k == 0 {
                    for (dst, v) in slice.iter_mut().zip(src) {
                        *dst = v * weight;
                    }
                } else {
                    for (dst, v) in slice.iter_mut().zip(src) {
                        *dst += v * weight;
                    }
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoiseOnly;

    impl NumericBackend for NoiseOnly {
        fn name(&self) -> &str {
            "noise-only"
        }

        fn supports(&self, capability: Capability) -> bool {
            capability == Capability::CoherentNoise
        }
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(1.5);
        assert_eq!(kernel.len(), 9);
        let sum: Float = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-7);
        }
        assert_eq!(gaussian_kernel(0.1).len(), 3);
    }

    #[test]
    fn probe_without_backend_degrades_both() {
        let caps = Capabilities::probe(None);
        assert_eq!(caps.noise, NoiseStrategy::PlanarApproximation);
        assert_eq!(caps.smoothing, SmoothingStrategy::Disabled);
        assert!(caps.is_degraded());
    }

    #[test]
    fn probe_partial_backend() {
        let backend = NoiseOnly;
        let caps = Capabilities::probe(Some(&backend));
        assert_eq!(caps.noise, NoiseStrategy::Accelerated);
        assert_eq!(caps.smoothing, SmoothingStrategy::Disabled);
        assert_eq!(caps.backend_name.as_deref(), Some("noise-only"));
    }

    #[test]
    fn probe_native_backend() {
        let backend = NativeBackend::new();
        let caps = Capabilities::probe(Some(&backend));
        assert!(!caps.is_degraded());
    }

    #[test]
    fn missing_blur_reports_unavailable() {
        let backend = NoiseOnly;
        let dims = Dimensions::cube(2);
        let input = vec![0.0; 8];
        let mut output = vec![0.0; 8];
        let err = backend.gaussian_blur_3d(&input, &mut output, dims, 1.0).unwrap_err();
        assert!(matches!(err, FieldError::AcceleratorUnavailable(Capability::GaussianBlur)));
    }

    #[test]
    fn blur_preserves_constant_field() {
        let dims = Dimensions::new(5, 4, 3);
        let input = vec![0.25; 60];
        let mut output = vec![0.0; 60];
        NativeBackend::new().gaussian_blur_3d(&input, &mut output, dims, 1.2).unwrap();
        for v in output {
            assert!((v - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn blur_spreads_an_impulse_and_keeps_mass() {
        let dims = Dimensions::cube(9);
        let mut input = vec![0.0; 729];
        input[4 + 4 * 9 + 4 * 81] = 1.0;
        let mut output = vec![0.0; 729];
        NativeBackend::new().gaussian_blur_3d(&input, &mut output, dims, 1.0).unwrap();

        let center = output[4 + 4 * 9 + 4 * 81];
        let neighbor = output[5 + 4 * 9 + 4 * 81];
        assert!(center < 1.0 && center > neighbor && neighbor > 0.0);
        let mass: Float = output.iter().sum();
        assert!((mass - 1.0).abs() < 1e-4);
    }

    #[test]
    fn thread_count_does_not_change_results() {
        let dims = Dimensions::new(6, 5, 7);
        let params = NoiseParams::default();
        let mut a = vec![0.0; 210];
        let mut b = vec![0.0; 210];
        NativeBackend::new().with_threads(1).generate_noise_3d(&mut a, dims, &params).unwrap();
        NativeBackend::new().with_threads(4).generate_noise_3d(&mut b, dims, &params).unwrap();
        assert_eq!(a, b);

        let mut blur_a = vec![0.0; 210];
        let mut blur_b = vec![0.0; 210];
        NativeBackend::new().with_threads(1).gaussian_blur_3d(&a, &mut blur_a, dims, 0.8).unwrap();
        NativeBackend::new().with_threads(3).gaussian_blur_3d(&a, &mut blur_b, dims, 0.8).unwrap();
        assert_eq!(blur_a, blur_b);
    }

    #[test]
    fn noise_rejects_wrong_length() {
        let mut out = vec![0.0; 7];
        let err = NativeBackend::new()
            .generate_noise_3d(&mut out, Dimensions::cube(2), &NoiseParams::default())
            .unwrap_err();
        assert!(matches!(err, FieldError::DimensionMismatch { expected: 8, actual: 7 }));
    }
}
