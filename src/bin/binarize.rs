//! Pyramid binarization CLI.
//!
//! ```bash
//! binarize SRC.bmp OUT.tiff [MODE] [NOISE_LEVEL | SIGMA_MULTIPLIER]
//! ```
//!
//! Binarizes an image and writes a 1-bit Group 3 compressed TIFF. Modes:
//! `avg`, `center`, `centerMinWeighted`, `avgCenterWeighted`,
//! `bySeparatedNoiseLevels`. The fourth argument is the noise level for the
//! fixed-gate modes and the σ multiplier for `bySeparatedNoiseLevels`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use retina_rs::prelude::*;

/// Produce a 1-bit image through an adaptive threshold surface.
#[derive(Parser)]
#[command(name = "binarize", version, about = "Pyramid adaptive binarizer", long_about = None)]
struct Cli {
	/// Input BMP image
	#[arg(value_name = "SRC")]
	input: Option<PathBuf>,

	/// Output 1-bit TIFF
	#[arg(value_name = "OUT")]
	output: Option<PathBuf>,

	/// Binarization mode
	#[arg(value_name = "MODE")]
	mode: Option<String>,

	/// Noise level (integer) or σ multiplier (float), depending on the mode
	#[arg(value_name = "LEVEL")]
	level: Option<String>,
}

/// Load a BMP file as BGR color
fn load_color(path: &Path) -> Result<RgbImage> {
	let image = image::open(path)
		.with_context(|| format!("loading {}", path.display()))?
		.to_rgb8();
	let (width, height) = image.dimensions();
	let mut data = image.into_raw();
	for pixel in data.chunks_exact_mut(3) {
		pixel.swap(0, 2);
	}
	Ok(RgbImage::from_raw(width as usize, height as usize, data))
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let cli = Cli::parse();
	let (Some(input), Some(output)) = (cli.input, cli.output) else {
		log::error!("Invalid number of arguments: source and destination paths are required");
		return Ok(());
	};

	// An unknown mode name is a precondition violation, not a recoverable
	// argument error.
	let mode = match cli.mode {
		Some(name) => name.parse::<BinarizationMode>().unwrap_or_else(|error| panic!("{error}")),
		None => BinarizationMode::default(),
	};

	let mut noise_level = Binarizer::NOISE_LEVEL;
	let mut sigma_multiplier = Binarizer::SIGMA_MULTIPLIER;
	if let Some(argument) = cli.level {
		if mode == BinarizationMode::BySeparatedNoiseLevels {
			match argument.parse() {
				Ok(parsed) => sigma_multiplier = parsed,
				Err(_) => log::warn!(
					"Invalid sigma multiplier argument {argument:?}, using {sigma_multiplier}"
				),
			}
		} else {
			match argument.parse() {
				Ok(parsed) => noise_level = parsed,
				Err(_) => {
					log::warn!("Invalid noise level argument {argument:?}, using {noise_level}");
				}
			}
		}
	}

	let color = load_color(&input)?;
	let gray = to_gray(&color);

	let start = Instant::now();
	let binarized = Binarizer::new(&gray, mode, noise_level, sigma_multiplier).binarize();
	let elapsed = start.elapsed().as_secs_f64();

	let megapixels = (gray.width() * gray.height()) as f64;
	println!("Binarize full time: {elapsed:.3} seconds");
	println!("Binarize relative time: {:.3} msec/MP", elapsed / megapixels / 1000.0);

	save_bilevel(&output, &binarized).with_context(|| format!("saving {}", output.display()))?;
	Ok(())
}
