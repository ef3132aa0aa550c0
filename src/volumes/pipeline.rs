// Copyright @yucwang 2026

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::core::backend::{Capabilities, NoiseStrategy, NumericBackend};
use crate::core::error::FieldError;
use crate::math::constants::Float;
use crate::volumes::importer::{self, ImportOutcome, VoxelFormat};
use crate::volumes::processor::{FieldProcessor, NormalizeOutcome, ProcessingParams, SmoothOutcome};
use crate::volumes::scalar_field::{Dimensions, ScalarField};
use crate::volumes::synthesizer::{FieldSynthesizer, SynthesisParams};

#[derive(Clone, Debug, PartialEq)]
pub enum DataSource {
    Generate,
    RawBytes(Arc<Vec<u8>>),
    RawFile(PathBuf),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumeSettings {
    pub dims: Dimensions,
    pub source: DataSource,
    pub synthesis: SynthesisParams,
    pub processing: ProcessingParams,
    /// Element format for raw sources; inferred from the size when unset.
    pub format: Option<VoxelFormat>,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            dims: Dimensions::cube(128),
            source: DataSource::Generate,
            synthesis: SynthesisParams::default(),
            processing: ProcessingParams::default(),
            format: None,
        }
    }
}

#[derive(Debug)]
pub struct RegenerationReport {
    pub generation: u64,
    pub dims: Dimensions,
    pub noise: Option<NoiseStrategy>,
    pub format: Option<VoxelFormat>,
    pub normalize: Option<NormalizeOutcome>,
    pub smooth: SmoothOutcome,
    pub value_range: (Float, Float),
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<FieldError>,
}

/// Produces, processes and publishes scalar fields.
///
/// A field becomes visible through `current` only once every pass has finished.
/// Concurrent `regenerate` calls run one after the other.
pub struct VolumePipeline {
    settings: VolumeSettings,
    backend: Option<Arc<dyn NumericBackend>>,
    capabilities: Capabilities,
    published: RwLock<Option<Arc<ScalarField>>>,
    generation: AtomicU64,
    regenerating: Mutex<()>,
}

impl VolumePipeline {
    pub fn new(settings: VolumeSettings, backend: Option<Arc<dyn NumericBackend>>) -> Self {
        let capabilities = Capabilities::probe(backend.as_deref());
        Self {
            settings,
            backend,
            capabilities,
            published: RwLock::new(None),
            generation: AtomicU64::new(0),
            regenerating: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &VolumeSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut VolumeSettings {
        &mut self.settings
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Last fully processed field, if any.
    pub fn current(&self) -> Option<Arc<ScalarField>> {
        match self.published.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn processor(&self) -> FieldProcessor {
        FieldProcessor::new(self.settings.processing, self.backend.clone(), self.capabilities.smoothing)
    }

    /// Build a new field and publish it. On error the previous field stays published.
    pub fn regenerate(&self) -> Result<RegenerationReport, FieldError> {
        let _guard = self.regenerating.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dims = self.settings.dims;
        let mut warnings = Vec::new();
        let mut noise = None;
        let mut format = None;

        let mut field = match &self.settings.source {
            DataSource::Generate => {
                let synthesizer = FieldSynthesizer::new(self.settings.synthesis,
                                                        &self.capabilities,
                                                        self.backend.clone());
                let outcome = synthesizer.synthesize(dims)?;
                noise = Some(outcome.noise);
                warnings.extend(outcome.warnings);
                outcome.field
            }
            DataSource::RawBytes(bytes) => {
                log::info!("Importing raw volume data from memory...");
                let outcome = self.import(bytes, dims)?;
                format = Some(outcome.format);
                warnings.extend(outcome.warning());
                outcome.field
            }
            DataSource::RawFile(path) => {
                log::info!("Importing raw volume data from {}...", path.display());
                let outcome = importer::import_file(path, dims, self.settings.format)?;
                format = Some(outcome.format);
                warnings.extend(outcome.warning());
                outcome.field
            }
        };

        let report = self.processor().process(&mut field)?;
        warnings.extend(report.warnings);
        let value_range = field.min_max();

        let field = Arc::new(field);
        match self.published.write() {
            Ok(mut guard) => *guard = Some(field),
            Err(poisoned) => *poisoned.into_inner() = Some(field),
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        log::info!("Volume data loaded successfully! Size: {}, generation {}.", dims, generation);

        Ok(RegenerationReport {
            generation,
            dims,
            noise,
            format,
            normalize: report.normalize,
            smooth: report.smooth,
            value_range,
            warnings,
        })
    }

    fn import(&self, bytes: &[u8], dims: Dimensions) -> Result<ImportOutcome, FieldError> {
        match self.settings.format {
            Some(format) => importer::import_bytes_with_format(bytes, dims, format),
            None => importer::import_bytes(bytes, dims),
        }
    }
}
