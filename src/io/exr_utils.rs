/* Copyright 2020 @TwoCookingMice */

use std::path::Path;

use exr::prelude::*;

use crate::core::error::FieldError;
use crate::renderers::slice_plane::SliceImage;

// Write a slice as a gray float EXR, raw values kept
pub fn write_slice_exr<P: AsRef<Path>>(slice: &SliceImage, path: P) -> std::result::Result<(), FieldError> {
    let path = path.as_ref();
    log::info!("Starting writing openexr slice: {}.", path.display());

    write_rgb_file(path, slice.width, slice.height, |x, y| {
        let v = slice.get(x, y);
        (v, v, v)
    })
    .map_err(|e| FieldError::Export(e.to_string()))?;

    log::info!("EXR written to: {}.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_exr_is_written() {
        let slice = SliceImage { width: 4, height: 3, data: (0..12).map(|v| v as f32 * 0.1).collect() };
        let mut path = std::env::temp_dir();
        path.push(format!("volscope_slice_{}.exr", std::process::id()));

        write_slice_exr(&slice, &path).unwrap();
        let written = std::fs::metadata(&path).unwrap().len();
        std::fs::remove_file(&path).ok();
        assert!(written > 0);
    }
}
