pub mod exr_utils;
pub mod image_utils;
pub mod raw_utils;
