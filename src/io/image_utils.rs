// Copyright @yucwang 2026

use std::path::Path;

use image::GrayImage;

use crate::core::error::FieldError;
use crate::renderers::slice_plane::SliceImage;

/// 8-bit grayscale export; the encoder follows the file extension.
pub fn write_slice_png<P: AsRef<Path>>(slice: &SliceImage, path: P) -> Result<(), FieldError> {
    let path = path.as_ref();
    let image = GrayImage::from_raw(slice.width as u32, slice.height as u32, slice.to_u8())
        .ok_or_else(|| FieldError::Export(format!("slice buffer does not cover {}x{}",
                                                  slice.width, slice.height)))?;
    image.save(path).map_err(|e| FieldError::Export(e.to_string()))?;
    log::info!("Slice image written to {}.", path.display());
    Ok(())
}
