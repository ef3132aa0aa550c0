// Copyright 2020 @TwoCookingMice

pub mod constants;
pub mod smooth_damp;
