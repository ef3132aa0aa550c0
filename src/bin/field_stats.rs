use volscope::volumes::importer::{import_file, VoxelFormat};
use volscope::volumes::processor::histogram;
use volscope::volumes::scalar_field::Dimensions;

fn parse_dim(args: &[String], i: usize) -> usize {
    args[i].parse::<usize>().unwrap_or_else(|_| {
        eprintln!("Invalid dimension: {}", args[i]);
        std::process::exit(1);
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!("Usage: {} <volume.raw> <width> <height> <depth> [u8|i16|f32] [--bins N]", args[0]);
        std::process::exit(1);
    }

    let dims = Dimensions::new(parse_dim(&args, 2), parse_dim(&args, 3), parse_dim(&args, 4));
    let mut format: Option<VoxelFormat> = None;
    let mut bins: usize = 10;

    let mut i = 5;
    while i < args.len() {
        match args[i].as_str() {
            "--bins" => {
                i += 1;
                bins = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(10).max(1);
            }
            name => match VoxelFormat::from_name(name) {
                Some(f) => format = Some(f),
                None => eprintln!("Ignoring unknown argument: {}", name),
            },
        }
        i += 1;
    }

    let outcome = import_file(&args[1], dims, format)
        .unwrap_or_else(|e| {
            eprintln!("failed to import {}: {}", args[1], e);
            std::process::exit(1);
        });

    let field = &outcome.field;
    let (min, max) = field.min_max();
    println!("Size: {} ({} voxels, {:?})", field.dimensions(), field.len(), outcome.format);
    if let Some(warning) = outcome.warning() {
        println!("Warning: {}", warning);
    }
    if outcome.trailing_bytes > 0 {
        println!("Trailing bytes ignored: {}", outcome.trailing_bytes);
    }
    println!("Min: {:.6}", min);
    println!("Max: {:.6}", max);
    println!("Mean: {:.6}", field.mean());

    let counts = histogram(field.voxels(), bins, min, max);
    let total = field.len().max(1) as f64;
    let steps = (bins - 1).max(1) as f32;
    for (bin, count) in counts.iter().enumerate() {
        let lo = min + (max - min) * bin as f32 / steps;
        println!("[{:>10.4}] {:>10} {:6.2}%", lo, count, 100.0 * *count as f64 / total);
    }
}
