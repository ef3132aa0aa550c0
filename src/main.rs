// Copyright 2020 TwoCookingMice

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use volscope::core::backend::{NativeBackend, NumericBackend};
use volscope::core::config::load_config;
use volscope::io::{exr_utils, image_utils, raw_utils};
use volscope::math::constants::Vector3f;
use volscope::renderers::slice_plane::{extract_slice, SliceAxis};
use volscope::sensors::orbit_camera::{CameraInput, OrbitCameraController};
use volscope::volumes::pipeline::VolumePipeline;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <viewer.xml> [--seed N] [--out volume.raw] [--slice AXIS] \
                   [--slice-exr PATH] [--slice-png PATH] [--bins N] [--no-accel]", args[0]);
        std::process::exit(1);
    }

    let config_path = &args[1];
    let mut seed: Option<u64> = None;
    let mut raw_out: Option<PathBuf> = None;
    let mut slice_axis = SliceAxis::Axial;
    let mut slice_exr: Option<PathBuf> = None;
    let mut slice_png: Option<PathBuf> = None;
    let mut bins: usize = 16;
    let mut accelerated = true;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok());
            }
            "--out" => {
                i += 1;
                raw_out = args.get(i).map(PathBuf::from);
            }
            "--slice" => {
                i += 1;
                slice_axis = args.get(i).and_then(|v| SliceAxis::from_name(v)).unwrap_or(SliceAxis::Axial);
            }
            "--slice-exr" => {
                i += 1;
                slice_exr = args.get(i).map(PathBuf::from);
            }
            "--slice-png" => {
                i += 1;
                slice_png = args.get(i).map(PathBuf::from);
            }
            "--bins" => {
                i += 1;
                bins = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(16).max(1);
            }
            "--no-accel" => accelerated = false,
            other => log::warn!("Ignoring unknown argument: {}.", other),
        }
        i += 1;
    }

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            std::process::exit(1);
        }
    };
    if let Some(seed) = seed {
        config.volume.synthesis.seed = seed;
    }

    let backend: Option<Arc<dyn NumericBackend>> = if accelerated {
        Some(Arc::new(NativeBackend::new().with_progress(true)))
    } else {
        None
    };

    let pipeline = VolumePipeline::new(config.volume.clone(), backend);
    let report = match pipeline.regenerate() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Regeneration failed: {}", e);
            std::process::exit(1);
        }
    };
    let field = match pipeline.current() {
        Some(field) => field,
        None => {
            eprintln!("No volume was published.");
            std::process::exit(1);
        }
    };

    let caps = pipeline.capabilities();
    println!("Backend: {} (noise {:?}, smoothing {:?})",
             caps.backend_name.as_deref().unwrap_or("none"), caps.noise, caps.smoothing);
    println!("Volume {} generation {}", report.dims, report.generation);
    println!("Normalize: {:?}", report.normalize);
    println!("Smooth: {:?}", report.smooth);
    println!("Value range: [{:.6}, {:.6}] mean {:.6}", report.value_range.0, report.value_range.1, field.mean());
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }

    let processor = pipeline.processor();
    let counts = processor.histogram(&field, bins, None);
    println!("Histogram ({} bins):", bins);
    for (bin, count) in counts.iter().enumerate() {
        println!("  {:>3}: {}", bin, count);
    }

    let render = &config.render;
    let mask = processor.threshold_mask(&field, render.min_threshold(), render.max_threshold());
    let inside = mask.iter().filter(|&&m| m > 0).count();
    println!("Threshold window [{:.3}, {:.3}] covers {} of {} voxels",
             render.min_threshold(), render.max_threshold(), inside, mask.len());

    for plane in render.slice_planes().iter() {
        println!("Slice {:<8} pos {:.3} visible {} local ({:.3}, {:.3}, {:.3})",
                 plane.axis.name(), plane.position, plane.visible,
                 plane.local_position.x, plane.local_position.y, plane.local_position.z);
    }

    let mut camera = OrbitCameraController::new(config.camera.clone());
    let pose = camera.update(0.0, &CameraInput::default(), Vector3f::zeros());
    println!("Camera at ({:.3}, {:.3}, {:.3}), yaw {:.1} pitch {:.1} distance {:.1}",
             pose.position.x, pose.position.y, pose.position.z,
             camera.yaw(), camera.pitch(), camera.distance());

    let slice = extract_slice(&*field, slice_axis, render.slice_position(slice_axis));
    let exports = [
        raw_out.as_ref().map(|path| raw_utils::write_raw_f32(&field, path)),
        slice_exr.as_ref().map(|path| exr_utils::write_slice_exr(&slice, path)),
        slice_png.as_ref().map(|path| image_utils::write_slice_png(&slice, path)),
    ];
    let mut failed = false;
    for result in exports.iter().flatten() {
        if let Err(e) = result {
            eprintln!("Export failed: {}", e);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
