// Copyright @yucwang 2026

use std::fs;
use std::path::Path;

use crate::core::error::FieldError;
use crate::volumes::scalar_field::ScalarField;

pub fn read_raw_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, FieldError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    log::info!("Loaded {} bytes from {}.", bytes.len(), path.display());
    Ok(bytes)
}

/// Little-endian f32 dump, readable back with the importer's 4-byte path.
pub fn write_raw_f32<P: AsRef<Path>>(field: &ScalarField, path: P) -> Result<(), FieldError> {
    let path = path.as_ref();
    let mut bytes = Vec::with_capacity(field.len() * 4);
    for v in field.voxels() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    fs::write(path, bytes)?;
    log::info!("Volume {} written to {}.", field.dimensions(), path.display());
    Ok(())
}
