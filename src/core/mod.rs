// Copyright @yucwang 2021

pub mod backend;
pub mod config;
pub mod error;
pub mod rng;
pub mod volume;
