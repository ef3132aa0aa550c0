// Copyright @yucwang 2026

pub mod importer;
pub mod noise;
pub mod pipeline;
pub mod processor;
pub mod scalar_field;
pub mod synthesizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFilterMode {
    Nearest,
    Trilinear,
}

pub(crate) fn clamp_index(idx: isize, size: usize) -> usize {
    idx.clamp(0, size as isize - 1) as usize
}

pub(crate) fn clamp_index3(idx: (isize, isize, isize), size: (usize, usize, usize)) -> (usize, usize, usize) {
    (
        clamp_index(idx.0, size.0),
        clamp_index(idx.1, size.1),
        clamp_index(idx.2, size.2),
    )
}
