// Copyright @yucwang 2026

use std::sync::Arc;

use crate::core::backend::{Capability, NumericBackend, SmoothingStrategy};
use crate::core::error::FieldError;
use crate::math::constants::{Float, EPSILON};
use crate::volumes::scalar_field::ScalarField;

/// Blur requests at or below this sigma are treated as "no blur".
pub const MIN_BLUR_SIGMA: Float = 0.01;
pub const MAX_BLUR_SIGMA: Float = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessingParams {
    pub normalize: bool,
    /// Input range mapped onto `[0, 1]` instead of the scanned min/max.
    pub custom_range: Option<(Float, Float)>,
    pub blur_sigma: Float,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self { normalize: true, custom_range: None, blur_sigma: 1.5 }
    }
}

impl ProcessingParams {
    pub fn with_blur_sigma(mut self, sigma: Float) -> Self {
        self.blur_sigma = sigma.clamp(0.0, MAX_BLUR_SIGMA);
        self
    }

    pub fn with_custom_range(mut self, range: Option<(Float, Float)>) -> Self {
        self.custom_range = range;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormalizeOutcome {
    Applied { min: Float, max: Float },
    /// Span below `EPSILON`; values left as they were.
    Skipped { min: Float, max: Float },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SmoothOutcome {
    Applied { sigma: Float },
    NotRequested,
    /// Requested, but no blur implementation is available.
    Degraded,
}

#[derive(Debug)]
pub struct ProcessReport {
    pub normalize: Option<NormalizeOutcome>,
    pub smooth: SmoothOutcome,
    pub warnings: Vec<FieldError>,
}

/// Maps every voxel through `clamp01((v - min) / (max - min))`.
pub fn normalize_voxels(voxels: &mut [Float], min: Float, max: Float) -> NormalizeOutcome {
    let range = max - min;
    if !(range > EPSILON) {
        return NormalizeOutcome::Skipped { min, max };
    }
    for v in voxels.iter_mut() {
        *v = ((*v - min) / range).clamp(0.0, 1.0);
    }
    NormalizeOutcome::Applied { min, max }
}

/// Counts values of `[min, max]` into `bins` equal buckets; others are ignored.
pub fn histogram(data: &[Float], bins: usize, min: Float, max: Float) -> Vec<u32> {
    let mut counts = vec![0u32; bins];
    let range = max - min;
    if bins == 0 || !(range > 0.0) {
        return counts;
    }

    let last = (bins - 1) as isize;
    for &v in data {
        if v >= min && v <= max {
            let bin = (((v - min) / range) * last as Float) as isize;
            counts[bin.clamp(0, last) as usize] += 1;
        }
    }
    counts
}

/// 255 for values inside `[min, max]`, 0 elsewhere.
pub fn threshold_mask(data: &[Float], min: Float, max: Float) -> Vec<u8> {
    data.iter()
        .map(|&v| if v >= min && v <= max { 255 } else { 0 })
        .collect()
}

pub struct FieldProcessor {
    params: ProcessingParams,
    backend: Option<Arc<dyn NumericBackend>>,
    smoothing: SmoothingStrategy,
}

impl FieldProcessor {
    pub fn new(params: ProcessingParams,
               backend: Option<Arc<dyn NumericBackend>>,
               smoothing: SmoothingStrategy) -> Self {
        Self { params, backend, smoothing }
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    /// Normalize, then smooth, once per produced field.
    pub fn process(&self, field: &mut ScalarField) -> Result<ProcessReport, FieldError> {
        let mut warnings = Vec::new();

        let normalize = if self.params.normalize {
            let outcome = self.normalize(field);
            if let NormalizeOutcome::Skipped { min, max } = outcome {
                warnings.push(FieldError::DegenerateRange { min, max });
            }
            Some(outcome)
        } else {
            None
        };

        let smooth = self.smooth(field)?;
        if smooth == SmoothOutcome::Degraded {
            warnings.push(FieldError::AcceleratorUnavailable(Capability::GaussianBlur));
        }

        Ok(ProcessReport { normalize, smooth, warnings })
    }

    pub fn normalize(&self, field: &mut ScalarField) -> NormalizeOutcome {
        let (scan_min, scan_max) = field.min_max();
        log::info!("Data range before normalization: [{}, {}].", scan_min, scan_max);

        let (min, max) = self.params.custom_range.unwrap_or((scan_min, scan_max));
        let outcome = normalize_voxels(field.voxels_mut(), min, max);
        match outcome {
            NormalizeOutcome::Applied { .. } => log::info!("Data normalized to [0, 1]."),
            NormalizeOutcome::Skipped { .. } => {
                log::warn!("Value span [{}, {}] too small, normalization skipped.", min, max)
            }
        }
        outcome
    }

    /// Replaces the buffer with a blurred copy. Not idempotent: call once per field.
    pub fn smooth(&self, field: &mut ScalarField) -> Result<SmoothOutcome, FieldError> {
        let sigma = self.params.blur_sigma;
        if !(sigma > MIN_BLUR_SIGMA) {
            return Ok(SmoothOutcome::NotRequested);
        }

        let backend = match (self.smoothing, self.backend.as_ref()) {
            (SmoothingStrategy::Accelerated, Some(backend)) => backend,
            _ => {
                log::warn!("Could not apply blur, no Gaussian blur backend available.");
                return Ok(SmoothOutcome::Degraded);
            }
        };

        let mut blurred = vec![0.0; field.len()];
        match backend.gaussian_blur_3d(field.voxels(), &mut blurred, field.dimensions(), sigma) {
            Ok(()) => {
                field.replace_voxels(blurred)?;
                log::info!("Gaussian blur applied, sigma = {}.", sigma);
                Ok(SmoothOutcome::Applied { sigma })
            }
            Err(FieldError::AcceleratorUnavailable(_)) => {
                log::warn!("Backend {} refused the blur, skipping.", backend.name());
                Ok(SmoothOutcome::Degraded)
            }
            Err(err) => Err(err),
        }
    }

    pub fn histogram(&self, field: &ScalarField, bins: usize, range: Option<(Float, Float)>) -> Vec<u32> {
        let (min, max) = range.unwrap_or_else(|| field.min_max());
        match self.backend.as_ref() {
            Some(backend) if backend.supports(Capability::Histogram) => {
                backend.histogram(field.voxels(), bins, min, max)
            }
            _ => histogram(field.voxels(), bins, min, max),
        }
    }

    pub fn threshold_mask(&self, field: &ScalarField, min: Float, max: Float) -> Vec<u8> {
        match self.backend.as_ref() {
            Some(backend) if backend.supports(Capability::Threshold) => {
                backend.threshold_mask(field.voxels(), min, max)
            }
            _ => threshold_mask(field.voxels(), min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::NativeBackend;
    use crate::volumes::scalar_field::Dimensions;

    fn field_from(values: Vec<Float>) -> ScalarField {
        let n = values.len();
        ScalarField::from_voxels(Dimensions::new(n, 1, 1), values).unwrap()
    }

    fn native_processor(params: ProcessingParams) -> FieldProcessor {
        FieldProcessor::new(params, Some(Arc::new(NativeBackend::new())), SmoothingStrategy::Accelerated)
    }

    #[test]
    fn normalize_spans_unit_interval() {
        let mut field = field_from(vec![-120.0, 0.0, 35.5, 400.0, 12.0]);
        let processor = native_processor(ProcessingParams::default().with_blur_sigma(0.0));
        let outcome = processor.normalize(&mut field);
        assert_eq!(outcome, NormalizeOutcome::Applied { min: -120.0, max: 400.0 });
        let (lo, hi) = field.min_max();
        assert!(lo.abs() < 1e-6);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_constant_field_is_noop() {
        let mut field = field_from(vec![3.0; 6]);
        let processor = native_processor(ProcessingParams::default().with_blur_sigma(0.0));
        let report = processor.process(&mut field).unwrap();
        assert!(matches!(report.normalize, Some(NormalizeOutcome::Skipped { .. })));
        assert!(matches!(report.warnings[0], FieldError::DegenerateRange { .. }));
        assert!(field.voxels().iter().all(|&v| v == 3.0));
    }

    #[test]
    fn custom_range_clamps_outliers() {
        let mut field = field_from(vec![-1000.0, 0.0, 50.0, 100.0, 3000.0]);
        let params = ProcessingParams::default()
            .with_blur_sigma(0.0)
            .with_custom_range(Some((0.0, 100.0)));
        native_processor(params).process(&mut field).unwrap();
        assert_eq!(field.voxels(), &[0.0, 0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn renormalizing_is_near_identity() {
        let mut field = field_from(vec![0.0, 0.25, 0.5, 1.0]);
        let processor = native_processor(ProcessingParams::default().with_blur_sigma(0.0));
        processor.normalize(&mut field);
        let before = field.voxels().to_vec();
        processor.normalize(&mut field);
        for (a, b) in before.iter().zip(field.voxels()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn smoothing_without_backend_is_degraded() {
        let mut field = field_from(vec![0.0, 1.0, 0.0, 1.0]);
        let processor = FieldProcessor::new(ProcessingParams::default(), None, SmoothingStrategy::Disabled);
        let report = processor.process(&mut field).unwrap();
        assert_eq!(report.smooth, SmoothOutcome::Degraded);
        assert!(report.warnings.iter().any(|w| matches!(w, FieldError::AcceleratorUnavailable(_))));
        assert_eq!(field.voxels(), &[0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn tiny_sigma_is_not_requested() {
        let mut field = field_from(vec![0.0, 1.0]);
        let processor = native_processor(ProcessingParams::default().with_blur_sigma(0.005));
        assert_eq!(processor.smooth(&mut field).unwrap(), SmoothOutcome::NotRequested);
    }

    #[test]
    fn repeated_blur_keeps_smoothing() {
        let dims = Dimensions::new(9, 1, 1);
        let mut values = vec![0.0; 9];
        values[4] = 1.0;
        let mut field = ScalarField::from_voxels(dims, values).unwrap();
        let processor = native_processor(ProcessingParams::default().with_normalize(false).with_blur_sigma(1.0));

        processor.smooth(&mut field).unwrap();
        let once = field.get(4, 0, 0).unwrap();
        processor.smooth(&mut field).unwrap();
        let twice = field.get(4, 0, 0).unwrap();
        assert!(once < 1.0);
        assert!(twice < once);
    }

    #[test]
    fn histogram_linear_buckets() {
        let data = [0.0, 0.1, 0.5, 0.99, 1.0, 1.5, -0.2];
        let counts = histogram(&data, 4, 0.0, 1.0);
        assert_eq!(counts, vec![2, 1, 1, 1]);
        assert_eq!(counts.iter().sum::<u32>(), 5);
        assert_eq!(histogram(&data, 4, 1.0, 1.0), vec![0; 4]);
    }

    #[test]
    fn threshold_mask_is_inclusive() {
        let mask = threshold_mask(&[0.1, 0.3, 0.6, 0.9, 1.0], 0.3, 0.9);
        assert_eq!(mask, vec![0, 255, 255, 255, 0]);
    }
}
