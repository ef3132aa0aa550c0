// Copyright @yucwang 2026

pub mod parameters;
pub mod slice_plane;
