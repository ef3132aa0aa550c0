// Copyright @yucwang 2026

use crate::math::constants::Float;
use crate::renderers::slice_plane::{SliceAxis, SlicePlane};

pub const MIN_STEP_SIZE: Float = 0.01;
pub const MAX_STEP_SIZE: Float = 0.2;
pub const MIN_DENSITY_MULTIPLIER: Float = 0.1;
pub const MAX_DENSITY_MULTIPLIER: Float = 5.0;

pub const DEFAULT_MIN_THRESHOLD: Float = 0.3;
pub const DEFAULT_MAX_THRESHOLD: Float = 1.0;
pub const DEFAULT_SLICE_POSITION: Float = 0.5;
pub const DEFAULT_STEP_SIZE: Float = 0.01;
pub const DEFAULT_DENSITY_MULTIPLIER: Float = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Volume,
    Slice(SliceAxis),
}

/// Values the volume shader reads every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    pub min_threshold: Float,
    pub max_threshold: Float,
    pub step_size: Float,
    pub density_multiplier: Float,
    pub show_volume: bool,
}

/// Threshold window, cut-planes and ray-march controls.
///
/// Every setter clamps into range and keeps `min_threshold <= max_threshold`.
/// NaN writes are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParameters {
    min_threshold: Float,
    max_threshold: Float,
    axial_position: Float,
    coronal_position: Float,
    sagittal_position: Float,
    show_volume: bool,
    show_axial: bool,
    show_coronal: bool,
    show_sagittal: bool,
    step_size: Float,
    density_multiplier: Float,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            min_threshold: DEFAULT_MIN_THRESHOLD,
            max_threshold: DEFAULT_MAX_THRESHOLD,
            axial_position: DEFAULT_SLICE_POSITION,
            coronal_position: DEFAULT_SLICE_POSITION,
            sagittal_position: DEFAULT_SLICE_POSITION,
            show_volume: true,
            show_axial: true,
            show_coronal: true,
            show_sagittal: true,
            step_size: DEFAULT_STEP_SIZE,
            density_multiplier: DEFAULT_DENSITY_MULTIPLIER,
        }
    }
}

fn accept(name: &str, value: Float) -> Option<Float> {
    if value.is_nan() {
        log::warn!("Ignoring NaN written to {}.", name);
        None
    } else {
        Some(value)
    }
}

impl RenderParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_threshold(&self) -> Float {
        self.min_threshold
    }

    pub fn max_threshold(&self) -> Float {
        self.max_threshold
    }

    pub fn step_size(&self) -> Float {
        self.step_size
    }

    pub fn density_multiplier(&self) -> Float {
        self.density_multiplier
    }

    pub fn slice_position(&self, axis: SliceAxis) -> Float {
        match axis {
            SliceAxis::Axial => self.axial_position,
            SliceAxis::Coronal => self.coronal_position,
            SliceAxis::Sagittal => self.sagittal_position,
        }
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        match layer {
            Layer::Volume => self.show_volume,
            Layer::Slice(SliceAxis::Axial) => self.show_axial,
            Layer::Slice(SliceAxis::Coronal) => self.show_coronal,
            Layer::Slice(SliceAxis::Sagittal) => self.show_sagittal,
        }
    }

    /// Raising the minimum past the maximum drags the maximum along.
    pub fn set_min_threshold(&mut self, value: Float) {
        if let Some(value) = accept("min_threshold", value) {
            self.min_threshold = value.clamp(0.0, 1.0);
            if self.min_threshold > self.max_threshold {
                self.max_threshold = self.min_threshold;
            }
        }
    }

    /// Lowering the maximum below the minimum drags the minimum along.
    pub fn set_max_threshold(&mut self, value: Float) {
        if let Some(value) = accept("max_threshold", value) {
            self.max_threshold = value.clamp(0.0, 1.0);
            if self.max_threshold < self.min_threshold {
                self.min_threshold = self.max_threshold;
            }
        }
    }

    pub fn set_threshold_window(&mut self, min: Float, max: Float) {
        self.set_min_threshold(min);
        self.set_max_threshold(max);
    }

    pub fn set_slice_position(&mut self, axis: SliceAxis, value: Float) {
        if let Some(value) = accept(axis.name(), value) {
            let value = value.clamp(0.0, 1.0);
            match axis {
                SliceAxis::Axial => self.axial_position = value,
                SliceAxis::Coronal => self.coronal_position = value,
                SliceAxis::Sagittal => self.sagittal_position = value,
            }
        }
    }

    pub fn set_visibility(&mut self, layer: Layer, visible: bool) {
        match layer {
            Layer::Volume => self.show_volume = visible,
            Layer::Slice(SliceAxis::Axial) => self.show_axial = visible,
            Layer::Slice(SliceAxis::Coronal) => self.show_coronal = visible,
            Layer::Slice(SliceAxis::Sagittal) => self.show_sagittal = visible,
        }
    }

    pub fn toggle_visibility(&mut self, layer: Layer) -> bool {
        let visible = !self.is_visible(layer);
        self.set_visibility(layer, visible);
        visible
    }

    pub fn set_step_size(&mut self, value: Float) {
        if let Some(value) = accept("step_size", value) {
            self.step_size = value.clamp(MIN_STEP_SIZE, MAX_STEP_SIZE);
        }
    }

    pub fn set_density_multiplier(&mut self, value: Float) {
        if let Some(value) = accept("density_multiplier", value) {
            self.density_multiplier = value.clamp(MIN_DENSITY_MULTIPLIER, MAX_DENSITY_MULTIPLIER);
        }
    }

    pub fn reset_thresholds(&mut self) {
        self.min_threshold = DEFAULT_MIN_THRESHOLD;
        self.max_threshold = DEFAULT_MAX_THRESHOLD;
    }

    pub fn reset_slices(&mut self) {
        self.axial_position = DEFAULT_SLICE_POSITION;
        self.coronal_position = DEFAULT_SLICE_POSITION;
        self.sagittal_position = DEFAULT_SLICE_POSITION;
    }

    /// Thresholds, slices and ray-march controls back to defaults; visibility is kept.
    pub fn reset_all(&mut self) {
        self.reset_thresholds();
        self.reset_slices();
        self.step_size = DEFAULT_STEP_SIZE;
        self.density_multiplier = DEFAULT_DENSITY_MULTIPLIER;
    }

    pub fn frame_uniforms(&self) -> FrameUniforms {
        FrameUniforms {
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            step_size: self.step_size,
            density_multiplier: self.density_multiplier,
            show_volume: self.show_volume,
        }
    }

    pub fn slice_plane(&self, axis: SliceAxis) -> SlicePlane {
        SlicePlane::new(axis, self.slice_position(axis), self.is_visible(Layer::Slice(axis)))
    }

    pub fn slice_planes(&self) -> [SlicePlane; 3] {
        [
            self.slice_plane(SliceAxis::Axial),
            self.slice_plane(SliceAxis::Coronal),
            self.slice_plane(SliceAxis::Sagittal),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = RenderParameters::new();
        assert_eq!(params.min_threshold(), 0.3);
        assert_eq!(params.max_threshold(), 1.0);
        assert_eq!(params.step_size(), 0.01);
        assert_eq!(params.density_multiplier(), 1.0);
        for axis in SliceAxis::ALL.iter() {
            assert_eq!(params.slice_position(*axis), 0.5);
            assert!(params.is_visible(Layer::Slice(*axis)));
        }
        assert!(params.is_visible(Layer::Volume));
    }

    #[test]
    fn raising_min_lifts_max() {
        let mut params = RenderParameters::new();
        params.set_max_threshold(0.5);
        params.set_min_threshold(0.8);
        assert_eq!(params.min_threshold(), 0.8);
        assert_eq!(params.max_threshold(), 0.8);
    }

    #[test]
    fn lowering_max_drops_min() {
        let mut params = RenderParameters::new();
        params.set_min_threshold(0.6);
        params.set_max_threshold(0.2);
        assert_eq!(params.max_threshold(), 0.2);
        assert_eq!(params.min_threshold(), 0.2);
    }

    #[test]
    fn window_invariant_holds_for_any_write_sequence() {
        let mut params = RenderParameters::new();
        let writes = [1.7, -0.4, 0.35, 0.9, 0.1, 0.95, 0.0, 2.0, 0.5];
        for (i, &v) in writes.iter().enumerate() {
            if i % 2 == 0 {
                params.set_min_threshold(v);
            } else {
                params.set_max_threshold(v);
            }
            assert!(params.min_threshold() <= params.max_threshold());
            assert!(params.min_threshold() >= 0.0 && params.max_threshold() <= 1.0);
        }
    }

    #[test]
    fn numeric_setters_clamp() {
        let mut params = RenderParameters::new();
        params.set_step_size(1.0);
        assert_eq!(params.step_size(), MAX_STEP_SIZE);
        params.set_step_size(0.0);
        assert_eq!(params.step_size(), MIN_STEP_SIZE);
        params.set_density_multiplier(100.0);
        assert_eq!(params.density_multiplier(), MAX_DENSITY_MULTIPLIER);
        params.set_density_multiplier(-3.0);
        assert_eq!(params.density_multiplier(), MIN_DENSITY_MULTIPLIER);
        params.set_slice_position(SliceAxis::Coronal, 1.3);
        assert_eq!(params.slice_position(SliceAxis::Coronal), 1.0);
    }

    #[test]
    fn nan_writes_are_ignored() {
        let mut params = RenderParameters::new();
        params.set_min_threshold(Float::NAN);
        params.set_step_size(Float::NAN);
        params.set_slice_position(SliceAxis::Axial, Float::NAN);
        assert_eq!(params, RenderParameters::new());
    }

    #[test]
    fn visibility_flags_are_independent() {
        let mut params = RenderParameters::new();
        params.set_visibility(Layer::Slice(SliceAxis::Coronal), false);
        assert!(!params.is_visible(Layer::Slice(SliceAxis::Coronal)));
        assert!(params.is_visible(Layer::Slice(SliceAxis::Axial)));
        assert!(params.is_visible(Layer::Volume));
        assert!(!params.toggle_visibility(Layer::Volume));
        assert!(!params.frame_uniforms().show_volume);
        assert!(!params.slice_planes()[1].visible);
    }

    #[test]
    fn resets_restore_defaults() {
        let mut params = RenderParameters::new();
        params.set_threshold_window(0.1, 0.2);
        params.set_slice_position(SliceAxis::Sagittal, 0.9);
        params.set_step_size(0.1);
        params.set_visibility(Layer::Volume, false);

        params.reset_all();
        assert_eq!(params.min_threshold(), DEFAULT_MIN_THRESHOLD);
        assert_eq!(params.slice_position(SliceAxis::Sagittal), DEFAULT_SLICE_POSITION);
        assert_eq!(params.step_size(), DEFAULT_STEP_SIZE);
        assert!(!params.is_visible(Layer::Volume));
    }
}
