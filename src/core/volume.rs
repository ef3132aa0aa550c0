// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};
use crate::volumes::scalar_field::Dimensions;

/// Read-only scalar volume addressed with normalized `[0, 1]^3` coordinates.
pub trait Volume: Send + Sync {
    fn dimensions(&self) -> Dimensions;
    fn eval(&self, p: Vector3f) -> Float;
}
