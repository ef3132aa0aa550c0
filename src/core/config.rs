// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::math::constants::{Float, Vector3f};
use crate::renderers::parameters::{Layer, RenderParameters};
use crate::renderers::slice_plane::SliceAxis;
use crate::sensors::orbit_camera::OrbitCameraSettings;
use crate::volumes::importer::VoxelFormat;
use crate::volumes::noise::NoiseParams;
use crate::volumes::pipeline::{DataSource, VolumeSettings};
use crate::volumes::scalar_field::Dimensions;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Parse(msg) => write!(f, "parse error: {}", msg),
            ConfigError::MissingField(name) => write!(f, "missing field: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything a viewer session starts from.
#[derive(Clone, Debug, Default)]
pub struct ViewerConfig {
    pub volume: VolumeSettings,
    pub render: RenderParameters,
    pub camera: OrbitCameraSettings,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig, ConfigError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = parse_config(&xml, base_dir)?;
    log::info!("Loaded viewer config from {}.", path.display());
    Ok(config)
}

/// Parses a `<viewer>` document. Relative raw file names resolve against `base_dir`.
pub fn parse_config(xml: &str, base_dir: &Path) -> Result<ViewerConfig, ConfigError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut state = ParseState {
        base_dir,
        defaults: HashMap::new(),
        config: ViewerConfig::default(),
        in_processing: false,
        in_render: false,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => state.element(&e, false)?,
            Ok(Event::Empty(e)) => state.element(&e, true)?,
            Ok(Event::End(e)) => state.end(e.name().as_ref()),
            Ok(_) => {}
            Err(e) => return Err(ConfigError::Parse(format!("xml error: {}", e))),
        }
        buf.clear();
    }

    Ok(state.config)
}

struct ParseState<'a> {
    base_dir: &'a Path,
    defaults: HashMap<String, String>,
    config: ViewerConfig,
    in_processing: bool,
    in_render: bool,
}

impl<'a> ParseState<'a> {
    fn element(&mut self, e: &BytesStart, is_empty: bool) -> Result<(), ConfigError> {
        match e.name().as_ref() {
            b"default" => {
                let attrs = read_attributes(e, &HashMap::new());
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            b"volume" => {
                let attrs = read_attributes(e, &self.defaults);
                let dims = self.config.volume.dims;
                self.config.volume.dims = Dimensions::new(
                    opt_usize(&attrs, "width")?.unwrap_or(dims.width),
                    opt_usize(&attrs, "height")?.unwrap_or(dims.height),
                    opt_usize(&attrs, "depth")?.unwrap_or(dims.depth));
            }
            b"source" => {
                let attrs = read_attributes(e, &self.defaults);
                parse_source(&attrs, self.base_dir, &mut self.config.volume)?;
            }
            b"noise" => {
                let attrs = read_attributes(e, &self.defaults);
                let synthesis = &mut self.config.volume.synthesis;
                let noise = synthesis.noise;
                synthesis.noise = NoiseParams::new(
                    opt_float(&attrs, "scale")?.unwrap_or(noise.scale),
                    opt_u32(&attrs, "octaves")?.unwrap_or(noise.octaves),
                    opt_float(&attrs, "persistence")?.unwrap_or(noise.persistence));
                if let Some(anatomy) = opt_bool(&attrs, "anatomy")? {
                    synthesis.anatomy = anatomy;
                }
            }
            b"processing" => {
                self.in_processing = !is_empty;
                let attrs = read_attributes(e, &self.defaults);
                let mut processing = self.config.volume.processing;
                if let Some(normalize) = opt_bool(&attrs, "normalize")? {
                    processing = processing.with_normalize(normalize);
                }
                if let Some(sigma) = opt_float(&attrs, "blur_sigma")? {
                    processing = processing.with_blur_sigma(sigma);
                }
                self.config.volume.processing = processing;
            }
            b"range" => {
                if self.in_processing {
                    let attrs = read_attributes(e, &self.defaults);
                    let min = opt_float(&attrs, "min")?.ok_or(ConfigError::MissingField("range.min"))?;
                    let max = opt_float(&attrs, "max")?.ok_or(ConfigError::MissingField("range.max"))?;
                    let processing = self.config.volume.processing;
                    self.config.volume.processing = processing.with_custom_range(Some((min, max)));
                }
            }
            b"render" => {
                self.in_render = !is_empty;
                let attrs = read_attributes(e, &self.defaults);
                parse_render(&attrs, &mut self.config.render)?;
            }
            b"slice" => {
                if self.in_render {
                    let attrs = read_attributes(e, &self.defaults);
                    parse_slice(&attrs, &mut self.config.render)?;
                }
            }
            b"camera" => {
                let attrs = read_attributes(e, &self.defaults);
                parse_camera(&attrs, &mut self.config.camera)?;
            }
            other => {
                log::debug!("Skipping config element <{}>.", String::from_utf8_lossy(other));
            }
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"processing" => self.in_processing = false,
            b"render" => self.in_render = false,
            _ => {}
        }
    }
}

fn parse_source(attrs: &HashMap<String, String>,
                base_dir: &Path,
                volume: &mut VolumeSettings) -> Result<(), ConfigError> {
    let source_type = attrs.get("type").map(String::as_str).unwrap_or("generate");
    match source_type {
        "generate" => {
            volume.source = DataSource::Generate;
            if let Some(seed) = opt_u64(attrs, "seed")? {
                volume.synthesis.seed = seed;
            }
        }
        "raw" => {
            let filename = attrs.get("filename").ok_or(ConfigError::MissingField("source.filename"))?;
            volume.source = DataSource::RawFile(base_dir.join(filename));
            if let Some(name) = attrs.get("format") {
                let format = VoxelFormat::from_name(name)
                    .ok_or_else(|| ConfigError::Parse(format!("unknown voxel format: {}", name)))?;
                volume.format = Some(format);
            }
        }
        other => return Err(ConfigError::Parse(format!("unsupported source: {}", other))),
    }
    Ok(())
}

fn parse_render(attrs: &HashMap<String, String>, render: &mut RenderParameters) -> Result<(), ConfigError> {
    let min = opt_float(attrs, "min_threshold")?.unwrap_or_else(|| render.min_threshold());
    let max = opt_float(attrs, "max_threshold")?.unwrap_or_else(|| render.max_threshold());
    render.set_threshold_window(min, max);
    if let Some(step) = opt_float(attrs, "step_size")? {
        render.set_step_size(step);
    }
    if let Some(density) = opt_float(attrs, "density")? {
        render.set_density_multiplier(density);
    }
    if let Some(visible) = opt_bool(attrs, "show_volume")? {
        render.set_visibility(Layer::Volume, visible);
    }
    Ok(())
}

fn parse_slice(attrs: &HashMap<String, String>, render: &mut RenderParameters) -> Result<(), ConfigError> {
    let name = attrs.get("axis").ok_or(ConfigError::MissingField("slice.axis"))?;
    let axis = SliceAxis::from_name(name)
        .ok_or_else(|| ConfigError::Parse(format!("unknown slice axis: {}", name)))?;
    if let Some(position) = opt_float(attrs, "position")? {
        render.set_slice_position(axis, position);
    }
    if let Some(visible) = opt_bool(attrs, "visible")? {
        render.set_visibility(Layer::Slice(axis), visible);
    }
    Ok(())
}

fn parse_camera(attrs: &HashMap<String, String>, camera: &mut OrbitCameraSettings) -> Result<(), ConfigError> {
    let floats: [(&str, &mut Float); 10] = [
        ("distance", &mut camera.distance),
        ("orbit_speed", &mut camera.orbit_speed),
        ("zoom_speed", &mut camera.zoom_speed),
        ("min_distance", &mut camera.min_distance),
        ("max_distance", &mut camera.max_distance),
        ("min_vertical_angle", &mut camera.min_vertical_angle),
        ("max_vertical_angle", &mut camera.max_vertical_angle),
        ("pan_speed", &mut camera.pan_speed),
        ("smooth_time", &mut camera.smooth_time),
        ("auto_rotate_speed", &mut camera.auto_rotate_speed),
    ];
    for (key, slot) in floats {
        if let Some(value) = opt_float(attrs, key)? {
            *slot = value;
        }
    }

    let flags: [(&str, &mut bool); 3] = [
        ("limit_vertical", &mut camera.limit_vertical_rotation),
        ("invert_y", &mut camera.invert_y),
        ("auto_rotate", &mut camera.auto_rotate),
    ];
    for (key, slot) in flags {
        if let Some(value) = opt_bool(attrs, key)? {
            *slot = value;
        }
    }

    let vectors: [(&str, &mut Vector3f); 3] = [
        ("default_position", &mut camera.default_position),
        ("default_rotation", &mut camera.default_rotation),
        ("target_offset", &mut camera.target_offset),
    ];
    for (key, slot) in vectors {
        if let Some(value) = attrs.get(key) {
            *slot = parse_vec3(value)?;
        }
    }

    if camera.min_distance > camera.max_distance {
        return Err(ConfigError::Parse(format!("camera min_distance {} exceeds max_distance {}",
                                              camera.min_distance, camera.max_distance)));
    }
    if camera.min_vertical_angle > camera.max_vertical_angle {
        return Err(ConfigError::Parse(format!("camera min_vertical_angle {} exceeds max_vertical_angle {}",
                                              camera.min_vertical_angle, camera.max_vertical_angle)));
    }
    Ok(())
}

fn read_attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = resolve_value(&attr.unescape_value().unwrap_or_default(), defaults);
        attrs.insert(key, value);
    }
    attrs
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn opt_float(attrs: &HashMap<String, String>, key: &str) -> Result<Option<Float>, ConfigError> {
    attrs.get(key).map(|v| parse_float(v)).transpose()
}

fn opt_u32(attrs: &HashMap<String, String>, key: &str) -> Result<Option<u32>, ConfigError> {
    attrs.get(key)
        .map(|v| v.parse::<u32>().map_err(|_| ConfigError::Parse(format!("invalid integer: {}", v))))
        .transpose()
}

fn opt_u64(attrs: &HashMap<String, String>, key: &str) -> Result<Option<u64>, ConfigError> {
    attrs.get(key)
        .map(|v| v.parse::<u64>().map_err(|_| ConfigError::Parse(format!("invalid integer: {}", v))))
        .transpose()
}

fn opt_usize(attrs: &HashMap<String, String>, key: &str) -> Result<Option<usize>, ConfigError> {
    attrs.get(key)
        .map(|v| v.parse::<usize>().map_err(|_| ConfigError::Parse(format!("invalid integer: {}", v))))
        .transpose()
}

fn opt_bool(attrs: &HashMap<String, String>, key: &str) -> Result<Option<bool>, ConfigError> {
    attrs.get(key)
        .map(|v| match v.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::Parse(format!("invalid boolean: {}", v))),
        })
        .transpose()
}

fn parse_float(value: &str) -> Result<Float, ConfigError> {
    value.parse::<Float>().map_err(|_| ConfigError::Parse(format!("invalid float: {}", value)))
}

fn parse_vec3(value: &str) -> Result<Vector3f, ConfigError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| ConfigError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| ConfigError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| ConfigError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}
