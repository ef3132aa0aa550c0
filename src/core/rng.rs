// Copyright @yucwang 2026

use crate::math::constants::Float;

/// 64-bit linear congruential generator.
///
/// Synthesis is reproducible from the seed alone, so every random draw in the
/// crate goes through one of these rather than a global source.
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: u64,
}

const MULTIPLIER: u64 = 6364136223846793005;
const INCREMENT: u64 = 1;

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        (self.state >> 32) as u32
    }

    /// Uniform in `[0, 1]`.
    pub fn next_f32(&mut self) -> Float {
        self.next_u32() as Float / u32::MAX as Float
    }

    /// Uniform sample in `[lo, hi]`.
    pub fn range(&mut self, lo: Float, hi: Float) -> Float {
        lo + (hi - lo) * self.next_f32()
    }

    /// Index in `[0, n)`; `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        self.next_u32() as usize % n
    }
}
