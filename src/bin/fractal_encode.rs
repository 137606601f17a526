//! Fractal image encoder CLI.
//!
//! ```bash
//! fractal-encode SRC.bmp DST.bin [R] [FastMode]
//! ```
//!
//! Compresses a 256×256 grayscale BMP into a fractal mapping stream. `R` is
//! the range-block side (4 by default, 8 allowed); the literal `FastMode`
//! enables the orientation-hash search.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use retina_rs::prelude::*;

/// Compress a grayscale image into its fractal representation.
#[derive(Parser)]
#[command(name = "fractal-encode", version, about = "Fractal image encoder", long_about = None)]
struct Cli {
	/// Input BMP image, 256×256 grayscale
	#[arg(value_name = "SRC")]
	input: Option<PathBuf>,

	/// Output mapping stream
	#[arg(value_name = "DST")]
	output: Option<PathBuf>,

	/// R-block side length, 4 or 8
	#[arg(value_name = "R")]
	r_block_size: Option<String>,

	/// Literal "FastMode" to prune the search by orientation hashes
	#[arg(value_name = "MODE")]
	fast_mode: Option<String>,
}

/// Load a BMP file as grayscale
fn load_gray(path: &Path) -> Result<GrayImage> {
	let image = image::open(path)
		.with_context(|| format!("loading {}", path.display()))?
		.to_luma8();
	let (width, height) = image.dimensions();
	Ok(GrayImage::from_raw(width as usize, height as usize, image.into_raw()))
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let cli = Cli::parse();
	let (Some(input), Some(output)) = (cli.input, cli.output) else {
		log::error!("Invalid number of arguments: source and destination paths are required");
		return Ok(());
	};

	let mut r_block_size = 4;
	if let Some(argument) = cli.r_block_size {
		match argument.parse() {
			Ok(parsed) => r_block_size = parsed,
			Err(_) => log::warn!(
				"Invalid R-block size argument {argument:?}, using {r_block_size} (4 or 8 allowed)"
			),
		}
	}
	let mut fast_mode = false;
	if let Some(argument) = cli.fast_mode {
		if argument != "FastMode" {
			log::warn!("Invalid mode argument {argument:?}: only \"FastMode\" is recognized");
		}
		fast_mode = true;
	}

	let gray = load_gray(&input)?;

	let start = Instant::now();
	let stream = Compressor::new(&gray, r_block_size, fast_mode).compress();
	std::fs::write(&output, &stream).with_context(|| format!("writing {}", output.display()))?;
	let elapsed = start.elapsed().as_secs_f64();

	println!("Encode full time: {elapsed:.3} seconds");
	println!("Encode relative time: {:.3} msec/MP", elapsed / (256.0 * 256.0) / 1000.0);
	Ok(())
}
