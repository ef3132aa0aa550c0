// Copyright @yucwang 2026

use std::fmt;

use crate::core::backend::Capability;
use crate::math::constants::Float;
use crate::volumes::scalar_field::Dimensions;

#[derive(Debug)]
pub enum FieldError {
    Io(std::io::Error),
    /// Inferred or requested element width is not 1, 2 or 4 bytes.
    UnsupportedFormat { bytes_per_voxel: usize },
    /// A buffer does not cover the requested voxel count.
    DimensionMismatch { expected: usize, actual: usize },
    /// Normalization met a value span too small to rescale.
    DegenerateRange { min: Float, max: Float },
    AcceleratorUnavailable(Capability),
    OutOfBounds { x: usize, y: usize, z: usize, dims: Dimensions },
    InvalidDimensions(Dimensions),
    /// An image encoder rejected a slice export.
    Export(String),
}

impl FieldError {
    /// Recoverable conditions the pipeline reports and keeps going on.
    pub fn is_warning(&self) -> bool {
        matches!(self,
                 FieldError::DimensionMismatch { .. }
                 | FieldError::DegenerateRange { .. }
                 | FieldError::AcceleratorUnavailable(_))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Io(err) => write!(f, "io error: {}", err),
            FieldError::UnsupportedFormat { bytes_per_voxel } => {
                write!(f, "unsupported data format: {} bytes per voxel", bytes_per_voxel)
            }
            FieldError::DimensionMismatch { expected, actual } => {
                write!(f, "expected {} voxels, buffer covers {}", expected, actual)
            }
            FieldError::DegenerateRange { min, max } => {
                write!(f, "degenerate value range [{}, {}]", min, max)
            }
            FieldError::AcceleratorUnavailable(cap) => {
                write!(f, "numeric backend does not provide {:?}", cap)
            }
            FieldError::OutOfBounds { x, y, z, dims } => {
                write!(f, "voxel ({}, {}, {}) outside {}", x, y, z, dims)
            }
            FieldError::InvalidDimensions(dims) => write!(f, "invalid volume dimensions {}", dims),
            FieldError::Export(msg) => write!(f, "export failed: {}", msg),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FieldError {
    fn from(err: std::io::Error) -> Self {
        FieldError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_the_recoverable_kinds() {
        assert!(FieldError::DegenerateRange { min: 0.5, max: 0.5 }.is_warning());
        assert!(FieldError::AcceleratorUnavailable(Capability::GaussianBlur).is_warning());
        assert!(FieldError::DimensionMismatch { expected: 8, actual: 4 }.is_warning());
        assert!(!FieldError::UnsupportedFormat { bytes_per_voxel: 3 }.is_warning());
    }

    #[test]
    fn display_names_the_width() {
        let msg = FieldError::UnsupportedFormat { bytes_per_voxel: 3 }.to_string();
        assert!(msg.contains("3 bytes per voxel"));
    }
}
