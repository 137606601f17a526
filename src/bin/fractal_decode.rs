//! Fractal image decoder CLI.
//!
//! ```bash
//! fractal-decode SRC.bin OUT_PREFIX [REFERENCE.bmp] [INTERMEDIATE_DIR] [ITERATIONS]
//! ```
//!
//! Restores `OUT_PREFIX.bmp` from a fractal mapping stream. With a reference
//! image the final PSNR lands in `OUT_PREFIX.txt`; with an intermediate
//! directory every iteration additionally dumps `result_{i}.bmp` and (given
//! a reference) `metrics_{i}.txt`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use retina_rs::prelude::*;

const DEFAULT_ITERATIONS: usize = 8;

/// Restore a grayscale image from its fractal representation.
#[derive(Parser)]
#[command(name = "fractal-decode", version, about = "Fractal image decoder", long_about = None)]
struct Cli {
	/// Input mapping stream
	#[arg(value_name = "SRC")]
	input: Option<PathBuf>,

	/// Output path prefix; the image lands at PREFIX.bmp
	#[arg(value_name = "OUT_PREFIX")]
	output_prefix: Option<String>,

	/// Reference image for PSNR reporting
	#[arg(value_name = "REFERENCE")]
	reference: Option<PathBuf>,

	/// Directory for per-iteration dumps
	#[arg(value_name = "INTERMEDIATE_DIR")]
	intermediate_dir: Option<PathBuf>,

	/// Number of decoding iterations
	#[arg(value_name = "ITERATIONS")]
	iterations: Option<String>,
}

/// Load a BMP file as grayscale
fn load_gray(path: &Path) -> Result<GrayImage> {
	let image = image::open(path)
		.with_context(|| format!("loading {}", path.display()))?
		.to_luma8();
	let (width, height) = image.dimensions();
	Ok(GrayImage::from_raw(width as usize, height as usize, image.into_raw()))
}

/// Save a grayscale buffer as BMP
fn save_gray(path: &Path, gray: &GrayImage) -> image::ImageResult<()> {
	image::save_buffer(
		path,
		gray.buffer(),
		gray.width() as u32,
		gray.height() as u32,
		image::ExtendedColorType::L8,
	)
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let cli = Cli::parse();
	let (Some(input), Some(output_prefix)) = (cli.input, cli.output_prefix) else {
		log::error!("Invalid number of arguments: stream path and output prefix are required");
		return Ok(());
	};

	let mut iterations = DEFAULT_ITERATIONS;
	if let Some(argument) = cli.iterations {
		match argument.parse() {
			Ok(parsed) => iterations = parsed,
			Err(_) => log::warn!(
				"Invalid iterations argument {argument:?}, using {DEFAULT_ITERATIONS}"
			),
		}
	}
	let reference = match &cli.reference {
		Some(path) => Some(load_gray(path)?),
		None => None,
	};

	let start = Instant::now();
	let decoder = Decompressor::open(&input).with_context(|| format!("reading {}", input.display()))?;
	let restored = decoder.decompress_with(iterations, rand::random(), |iteration, current| {
		let Some(directory) = &cli.intermediate_dir else {
			return;
		};
		let image_path = directory.join(format!("result_{iteration}.bmp"));
		if let Err(error) = save_gray(&image_path, current) {
			log::warn!("Failed to save {}: {error}", image_path.display());
		}
		if let Some(reference) = &reference {
			let metrics_path = directory.join(format!("metrics_{iteration}.txt"));
			if let Err(error) = calculate_metrics(current, reference).save_to_file(&metrics_path) {
				log::warn!("Failed to save {}: {error}", metrics_path.display());
			}
		}
	});
	let elapsed = start.elapsed().as_secs_f64();

	let relative = elapsed / (256.0 * 256.0) / 1000.0;
	println!("Decode full time: {elapsed:.3} seconds");
	println!("Decode relative time: {relative:.3} msec/MP");
	println!("Decode one iteration time: {:.3} seconds", elapsed / iterations as f64);
	println!("Decode one iteration relative time: {:.3} msec/MP", relative / iterations as f64);

	if let Some(reference) = &reference {
		let metrics = calculate_metrics(&restored, reference);
		println!("MSE: {:.3}", metrics.mse);
		println!("PSNR: {:.3}", metrics.psnr);
		let metrics_path = format!("{output_prefix}.txt");
		std::fs::write(&metrics_path, format!("{:.3}\n", metrics.psnr))
			.with_context(|| format!("writing {metrics_path}"))?;
	}

	let image_path = format!("{output_prefix}.bmp");
	save_gray(Path::new(&image_path), &restored).with_context(|| format!("saving {image_path}"))?;
	Ok(())
}
