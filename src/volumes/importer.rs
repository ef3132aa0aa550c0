// Copyright @yucwang 2026

use std::path::Path;

use crate::core::error::FieldError;
use crate::io::raw_utils;
use crate::math::constants::Float;
use crate::volumes::scalar_field::{Dimensions, ScalarField};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoxelFormat {
    /// Unsigned byte scaled to `[0, 1]`.
    U8,
    /// Signed little-endian short kept as its raw value.
    I16,
    /// Little-endian IEEE float kept as-is.
    F32,
}

impl VoxelFormat {
    pub fn bytes_per_voxel(&self) -> usize {
        match self {
            VoxelFormat::U8 => 1,
            VoxelFormat::I16 => 2,
            VoxelFormat::F32 => 4,
        }
    }

    pub fn from_bytes_per_voxel(bytes_per_voxel: usize) -> Result<Self, FieldError> {
        match bytes_per_voxel {
            1 => Ok(VoxelFormat::U8),
            2 => Ok(VoxelFormat::I16),
            4 => Ok(VoxelFormat::F32),
            _ => Err(FieldError::UnsupportedFormat { bytes_per_voxel }),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "u8" | "uint8" => Some(VoxelFormat::U8),
            "i16" | "int16" => Some(VoxelFormat::I16),
            "f32" | "float32" => Some(VoxelFormat::F32),
            _ => None,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Float {
        match self {
            VoxelFormat::U8 => bytes[0] as Float / 255.0,
            VoxelFormat::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as Float,
            VoxelFormat::F32 => Float::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub field: ScalarField,
    pub format: VoxelFormat,
    pub decoded_voxels: usize,
    /// Voxels the buffer did not cover; left at zero.
    pub missing_voxels: usize,
    /// Bytes past the last decoded voxel.
    pub trailing_bytes: usize,
}

impl ImportOutcome {
    pub fn warning(&self) -> Option<FieldError> {
        if self.missing_voxels == 0 {
            return None;
        }
        Some(FieldError::DimensionMismatch {
            expected: self.decoded_voxels + self.missing_voxels,
            actual: self.decoded_voxels,
        })
    }
}

/// Element width guessed from `byte_len / voxel_count`.
pub fn infer_format(byte_len: usize, dims: Dimensions) -> Result<VoxelFormat, FieldError> {
    let count = dims.voxel_count()?;
    VoxelFormat::from_bytes_per_voxel(byte_len / count)
}

pub fn import_bytes(bytes: &[u8], dims: Dimensions) -> Result<ImportOutcome, FieldError> {
    let format = infer_format(bytes.len(), dims)?;
    log::info!("Detected {} bytes per voxel.", format.bytes_per_voxel());
    import_bytes_with_format(bytes, dims, format)
}

/// Decode with a known element format. Never reads past the end of `bytes`.
pub fn import_bytes_with_format(bytes: &[u8],
                                dims: Dimensions,
                                format: VoxelFormat) -> Result<ImportOutcome, FieldError> {
    let mut field = ScalarField::new(dims)?;
    let count = field.len();
    let stride = format.bytes_per_voxel();

    let mut decoded = 0;
    for (dst, chunk) in field.voxels_mut().iter_mut().zip(bytes.chunks_exact(stride)) {
        *dst = format.decode(chunk);
        decoded += 1;
    }

    let outcome = ImportOutcome {
        field,
        format,
        decoded_voxels: decoded,
        missing_voxels: count - decoded,
        trailing_bytes: bytes.len() - decoded * stride,
    };
    if outcome.missing_voxels > 0 {
        log::warn!("Raw data covers {} of {} voxels, the rest stay at zero.", decoded, count);
    }
    if outcome.trailing_bytes > 0 {
        log::debug!("Ignoring {} trailing bytes.", outcome.trailing_bytes);
    }
    Ok(outcome)
}

pub fn import_file<P: AsRef<Path>>(path: P,
                                   dims: Dimensions,
                                   format: Option<VoxelFormat>) -> Result<ImportOutcome, FieldError> {
    let bytes = raw_utils::read_raw_bytes(path)?;
    match format {
        Some(format) => import_bytes_with_format(&bytes, dims, format),
        None => import_bytes(&bytes, dims),
    }
}
