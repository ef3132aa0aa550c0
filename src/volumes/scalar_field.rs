// Copyright @yucwang 2026

use std::fmt;

use crate::core::error::FieldError;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::{clamp_index3, VolumeFilterMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self { width, height, depth }
    }

    pub fn cube(size: usize) -> Self {
        Self::new(size, size, size)
    }

    /// Number of voxels, rejecting empty and overflowing shapes.
    pub fn voxel_count(&self) -> Result<usize, FieldError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(FieldError::InvalidDimensions(*self));
        }
        self.width
            .checked_mul(self.height)
            .and_then(|v| v.checked_mul(self.depth))
            .ok_or(FieldError::InvalidDimensions(*self))
    }

    pub fn slice_len(&self) -> usize {
        self.width * self.height
    }

    fn as_tuple(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Dense scalar volume stored X-fastest, then Y, then Z.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    dims: Dimensions,
    voxels: Vec<Float>,
}

impl ScalarField {
    pub fn new(dims: Dimensions) -> Result<Self, FieldError> {
        let count = dims.voxel_count()?;
        Ok(Self { dims, voxels: vec![0.0; count] })
    }

    pub fn from_voxels(dims: Dimensions, voxels: Vec<Float>) -> Result<Self, FieldError> {
        let count = dims.voxel_count()?;
        if voxels.len() != count {
            return Err(FieldError::DimensionMismatch { expected: count, actual: voxels.len() });
        }
        Ok(Self { dims, voxels })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    pub fn depth(&self) -> usize {
        self.dims.depth
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn voxels(&self) -> &[Float] {
        &self.voxels
    }

    pub fn voxels_mut(&mut self) -> &mut [Float] {
        &mut self.voxels
    }

    pub fn into_voxels(self) -> Vec<Float> {
        self.voxels
    }

    /// Swap in a derived buffer of the same length.
    pub fn replace_voxels(&mut self, voxels: Vec<Float>) -> Result<(), FieldError> {
        if voxels.len() != self.voxels.len() {
            return Err(FieldError::DimensionMismatch { expected: self.voxels.len(), actual: voxels.len() });
        }
        self.voxels = voxels;
        Ok(())
    }

    pub fn index(&self, x: usize, y: usize, z: usize) -> Result<usize, FieldError> {
        if x >= self.dims.width || y >= self.dims.height || z >= self.dims.depth {
            return Err(FieldError::OutOfBounds { x, y, z, dims: self.dims });
        }
        Ok(self.index_unchecked(x, y, z))
    }

    pub fn coords(&self, index: usize) -> Result<(usize, usize, usize), FieldError> {
        if index >= self.voxels.len() {
            let slice = self.dims.slice_len();
            return Err(FieldError::OutOfBounds {
                x: index % self.dims.width,
                y: (index / self.dims.width) % self.dims.height,
                z: index / slice,
                dims: self.dims,
            });
        }
        let slice = self.dims.slice_len();
        let z = index / slice;
        let rem = index % slice;
        Ok((rem % self.dims.width, rem / self.dims.width, z))
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<Float, FieldError> {
        let idx = self.index(x, y, z)?;
        Ok(self.voxels[idx])
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, value: Float) -> Result<(), FieldError> {
        let idx = self.index(x, y, z)?;
        self.voxels[idx] = value;
        Ok(())
    }

    /// Lookup with every coordinate clamped into the grid.
    pub fn get_clamped(&self, x: isize, y: isize, z: isize) -> Float {
        let (x, y, z) = clamp_index3((x, y, z), self.dims.as_tuple());
        self.voxels[self.index_unchecked(x, y, z)]
    }

    pub fn min_max(&self) -> (Float, Float) {
        self.voxels.iter().fold((Float::MAX, Float::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn mean(&self) -> Float {
        let sum: f64 = self.voxels.iter().map(|&v| v as f64).sum();
        (sum / self.voxels.len() as f64) as Float
    }

    pub fn sample(&self, p: Vector3f, filter: VolumeFilterMode) -> Float {
        let p = Vector3f::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0), p.z.clamp(0.0, 1.0));
        match filter {
            VolumeFilterMode::Nearest => self.sample_nearest(p),
            VolumeFilterMode::Trilinear => self.sample_trilinear(p),
        }
    }

    pub(crate) fn index_unchecked(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims.width + z * self.dims.slice_len()
    }

    fn sample_nearest(&self, p: Vector3f) -> Float {
        let x = p.x * (self.dims.width as Float - 1.0);
        let y = p.y * (self.dims.height as Float - 1.0);
        let z = p.z * (self.dims.depth as Float - 1.0);

        self.get_clamped((x + 0.5).floor() as isize,
                         (y + 0.5).floor() as isize,
                         (z + 0.5).floor() as isize)
    }

    fn sample_trilinear(&self, p: Vector3f) -> Float {
        let x = p.x * (self.dims.width as Float - 1.0);
        let y = p.y * (self.dims.height as Float - 1.0);
        let z = p.z * (self.dims.depth as Float - 1.0);

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let z0 = z.floor() as isize;

        let tx = x - x0 as Float;
        let ty = y - y0 as Float;
        let tz = z - z0 as Float;

        let c000 = self.get_clamped(x0, y0, z0);
        let c100 = self.get_clamped(x0 + 1, y0, z0);
        let c010 = self.get_clamped(x0, y0 + 1, z0);
        let c110 = self.get_clamped(x0 + 1, y0 + 1, z0);
        let c001 = self.get_clamped(x0, y0, z0 + 1);
        let c101 = self.get_clamped(x0 + 1, y0, z0 + 1);
        let c011 = self.get_clamped(x0, y0 + 1, z0 + 1);
        let c111 = self.get_clamped(x0 + 1, y0 + 1, z0 + 1);

        let c00 = c000 * (1.0 - tx) + c100 * tx;
        let c10 = c010 * (1.0 - tx) + c110 * tx;
        let c01 = c001 * (1.0 - tx) + c101 * tx;
        let c11 = c011 * (1.0 - tx) + c111 * tx;

        let c0 = c00 * (1.0 - ty) + c10 * ty;
        let c1 = c01 * (1.0 - ty) + c11 * ty;

        c0 * (1.0 - tz) + c1 * tz
    }
}

impl Volume for ScalarField {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn eval(&self, p: Vector3f) -> Float {
        self.sample(p, VolumeFilterMode::Trilinear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_field() -> ScalarField {
        let dims = Dimensions::new(2, 2, 2);
        let data: Vec<Float> = (0..8).map(|v| v as Float).collect();
        ScalarField::from_voxels(dims, data).expect("ramp field")
    }

    #[test]
    fn index_is_x_fastest() {
        let field = ScalarField::new(Dimensions::new(4, 3, 2)).unwrap();
        assert_eq!(field.index(1, 0, 0).unwrap(), 1);
        assert_eq!(field.index(0, 1, 0).unwrap(), 4);
        assert_eq!(field.index(0, 0, 1).unwrap(), 12);
        assert_eq!(field.index(3, 2, 1).unwrap(), 23);
        assert_eq!(field.coords(23).unwrap(), (3, 2, 1));
        assert_eq!(field.coords(5).unwrap(), (1, 1, 0));
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let mut field = ScalarField::new(Dimensions::new(4, 3, 2)).unwrap();
        assert!(matches!(field.get(4, 0, 0), Err(FieldError::OutOfBounds { .. })));
        assert!(matches!(field.set(0, 0, 2, 1.0), Err(FieldError::OutOfBounds { .. })));
        assert!(field.coords(24).is_err());
    }

    #[test]
    fn set_then_get() {
        let mut field = ScalarField::new(Dimensions::new(3, 3, 3)).unwrap();
        field.set(2, 1, 0, 0.75).unwrap();
        assert_eq!(field.get(2, 1, 0).unwrap(), 0.75);
        assert_eq!(field.voxels()[2 + 3], 0.75);
    }

    #[test]
    fn from_voxels_checks_length() {
        let err = ScalarField::from_voxels(Dimensions::new(2, 2, 2), vec![0.0; 7]).unwrap_err();
        assert!(matches!(err, FieldError::DimensionMismatch { expected: 8, actual: 7 }));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(ScalarField::new(Dimensions::new(0, 4, 4)),
                         Err(FieldError::InvalidDimensions(_))));
    }

    #[test]
    fn clamped_lookup_never_wraps() {
        let field = ramp_field();
        assert_eq!(field.get_clamped(-5, 0, 0), 0.0);
        assert_eq!(field.get_clamped(9, 9, 9), 7.0);
    }

    #[test]
    fn trilinear_center() {
        let field = ramp_field();
        let v = field.sample(Vector3f::new(0.5, 0.5, 0.5), VolumeFilterMode::Trilinear);
        assert!((v - 3.5).abs() < 1e-5);
    }

    #[test]
    fn nearest_corner() {
        let field = ramp_field();
        let v = field.sample(Vector3f::new(0.1, 0.1, 0.1), VolumeFilterMode::Nearest);
        assert_eq!(v, 0.0);
        let v = field.sample(Vector3f::new(2.0, 2.0, 2.0), VolumeFilterMode::Nearest);
        assert_eq!(v, 7.0);
    }

    #[test]
    fn min_max_and_mean() {
        let field = ramp_field();
        assert_eq!(field.min_max(), (0.0, 7.0));
        assert!((field.mean() - 3.5).abs() < 1e-6);
    }
}
