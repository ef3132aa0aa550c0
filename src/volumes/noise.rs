// Copyright @yucwang 2026

//! Coherent noise used to seed synthetic volumes.
//!
//! `fractal_value_noise` is the full 3D lattice noise the native backend evaluates.
//! `PlanarNoise` is the cheap stand-in used when no backend provides 3D noise: it
//! averages three 2D gradient-noise planes, so it only approximates a 3D field and
//! will not match the lattice noise value for value.

use crate::core::rng::LcgRng;
use crate::math::constants::Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    pub scale: Float,
    pub octaves: u32,
    pub persistence: Float,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self { scale: 2.0, octaves: 4, persistence: 0.5 }
    }
}

impl NoiseParams {
    pub fn new(scale: Float, octaves: u32, persistence: Float) -> Self {
        Self {
            scale: scale.clamp(0.1, 10.0),
            octaves: octaves.clamp(1, 8),
            persistence: persistence.clamp(0.1, 0.9),
        }
    }
}

fn hash3(x: i32, y: i32, z: i32) -> Float {
    let mut n = x.wrapping_add(y.wrapping_mul(57)).wrapping_add(z.wrapping_mul(997));
    n = n.wrapping_shl(13) ^ n;
    let m = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789221))
        .wrapping_add(1376312589);
    1.0 - ((m & 0x7fff_ffff) as Float) / 1073741824.0
}

fn lerp(a: Float, b: Float, t: Float) -> Float {
    a + t * (b - a)
}

fn smoothstep(t: Float) -> Float {
    t * t * (3.0 - 2.0 * t)
}

fn fade(t: Float) -> Float {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Single octave of lattice value noise in `[-1, 1]`.
pub fn value_noise_3d(x: Float, y: Float, z: Float) -> Float {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let zi = z.floor() as i32;

    let u = smoothstep(x - xi as Float);
    let v = smoothstep(y - yi as Float);
    let w = smoothstep(z - zi as Float);

    let c000 = hash3(xi, yi, zi);
    let c100 = hash3(xi + 1, yi, zi);
    let c010 = hash3(xi, yi + 1, zi);
    let c110 = hash3(xi + 1, yi + 1, zi);
    let c001 = hash3(xi, yi, zi + 1);
    let c101 = hash3(xi + 1, yi, zi + 1);
    let c011 = hash3(xi, yi + 1, zi + 1);
    let c111 = hash3(xi + 1, yi + 1, zi + 1);

    let x00 = lerp(c000, c100, u);
    let x10 = lerp(c010, c110, u);
    let x01 = lerp(c001, c101, u);
    let x11 = lerp(c011, c111, u);

    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Octave sum of `value_noise_3d` at a normalized position, remapped to `[0, 1]`.
///
/// `p` is the voxel coordinate divided by the grid extent along each axis.
pub fn fractal_value_noise(p: (Float, Float, Float), params: &NoiseParams) -> Float {
    let mut total = 0.0;
    let mut frequency = params.scale;
    let mut amplitude = 1.0;
    let mut max_value = 0.0;

    for _ in 0..params.octaves.max(1) {
        total += value_noise_3d(p.0 * frequency, p.1 * frequency, p.2 * frequency) * amplitude;
        max_value += amplitude;
        amplitude *= params.persistence;
        frequency *= 2.0;
    }

    (total / max_value + 1.0) * 0.5
}

/// 2D gradient noise with a seeded permutation table.
pub struct PlanarNoise {
    perm: [u8; 512],
}

impl PlanarNoise {
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = [0; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut rng = LcgRng::new(seed ^ 0x9e37_79b9_7f4a_7c15);
        for i in (1..256).rev() {
            let j = rng.below(i + 1);
            table.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    /// Gradient noise in `[0, 1]` (roughly centered on 0.5).
    pub fn sample(&self, x: Float, y: Float) -> Float {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let x = x - xf;
        let y = y - yf;

        let u = fade(x);
        let v = fade(y);

        let aa = self.perm[self.perm[xi] as usize + yi];
        let ab = self.perm[self.perm[xi] as usize + yi + 1];
        let ba = self.perm[self.perm[xi + 1] as usize + yi];
        let bb = self.perm[self.perm[xi + 1] as usize + yi + 1];

        let n = lerp(lerp(grad2(aa, x, y), grad2(ba, x - 1.0, y), u),
                     lerp(grad2(ab, x, y - 1.0), grad2(bb, x - 1.0, y - 1.0), u),
                     v);
        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Average of the (x,y), (y,z) and (z,x) planes, summed over octaves.
    pub fn fractal_sample(&self, p: (Float, Float, Float), params: &NoiseParams) -> Float {
        let mut total = 0.0;
        let mut frequency = params.scale;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..params.octaves.max(1) {
            let (x, y, z) = (p.0 * frequency, p.1 * frequency, p.2 * frequency);
            let planes = self.sample(x, y) + self.sample(y, z) + self.sample(z, x);
            total += planes / 3.0 * amplitude;
            max_value += amplitude;
            amplitude *= params.persistence;
            frequency *= 2.0;
        }

        total / max_value
    }
}

fn grad2(hash: u8, x: Float, y: Float) -> Float {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_bounded() {
        for x in -20..20 {
            for y in -3..3 {
                let h = hash3(x, y, x * y);
                assert!(h > -1.0 - 1e-6 && h <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn value_noise_matches_lattice_corners() {
        assert!((value_noise_3d(3.0, 4.0, 5.0) - hash3(3, 4, 5)).abs() < 1e-6);
        assert!((value_noise_3d(-1.0, 0.0, 2.0) - hash3(-1, 0, 2)).abs() < 1e-6);
    }

    #[test]
    fn fractal_noise_is_normalized_and_deterministic() {
        let params = NoiseParams::default();
        for i in 0..64 {
            let p = (i as Float / 64.0, (i * 7 % 64) as Float / 64.0, (i * 13 % 64) as Float / 64.0);
            let a = fractal_value_noise(p, &params);
            let b = fractal_value_noise(p, &params);
            assert_eq!(a, b);
            assert!(a >= -1e-6 && a <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn planar_noise_is_bounded() {
        let noise = PlanarNoise::new(3);
        let params = NoiseParams::new(2.0, 3, 0.5);
        for i in 0..100 {
            let t = i as Float * 0.173;
            let v = noise.fractal_sample((t, t * 0.5, 1.0 - t), &params);
            assert!(v >= 0.0 && v <= 1.0);
        }
    }

    #[test]
    fn params_are_clamped() {
        let params = NoiseParams::new(50.0, 0, 0.95);
        assert_eq!(params.scale, 10.0);
        assert_eq!(params.octaves, 1);
        assert_eq!(params.persistence, 0.9);
    }
}
