//! VNG demosaicing CLI.
//!
//! Reads `./source_images/CFA.bmp`, recovers the full color image, writes it
//! to `./recovered.bmp` and reports timing plus MSE/PSNR against
//! `./source_images/Original.bmp`.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use retina_rs::prelude::*;

const CFA_PATH: &str = "./source_images/CFA.bmp";
const REFERENCE_PATH: &str = "./source_images/Original.bmp";
const RECOVERED_PATH: &str = "./recovered.bmp";

/// Recover a color image from a Bayer-mosaic CFA capture.
#[derive(Parser)]
#[command(name = "vng", version, about = "VNG demosaicer", long_about = None)]
struct Cli {}

/// Load a BMP file as grayscale
fn load_gray(path: &Path) -> Result<GrayImage> {
	let image = image::open(path)
		.with_context(|| format!("loading {}", path.display()))?
		.to_luma8();
	let (width, height) = image.dimensions();
	Ok(GrayImage::from_raw(width as usize, height as usize, image.into_raw()))
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

/// Save a BGR color buffer as BMP
fn save_color(path: &Path, color: &RgbImage) -> Result<()> {
	let mut data = color.buffer().to_vec();
	for pixel in data.chunks_exact_mut(3) {
		pixel.swap(0, 2);
	}
	image::save_buffer(
		path,
		&data,
		color.width() as u32,
		color.height() as u32,
		image::ExtendedColorType::Rgb8,
	)
	.with_context(|| format!("saving {}", path.display()))
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let _cli = Cli::parse();

	let cfa = load_gray(Path::new(CFA_PATH))?;

	let start = Instant::now();
	let recovered = Demosaicer::new(&cfa).recover();
	let elapsed = start.elapsed().as_secs_f64();

	save_color(Path::new(RECOVERED_PATH), &recovered)?;

	let reference = load_color(Path::new(REFERENCE_PATH))?;
	let recovered_gray = to_gray(&recovered);
	let reference_gray = to_gray(&reference);
	let metrics = calculate_metrics(&recovered_gray, &reference_gray);
	let interior = calculate_metrics_cropped(&recovered_gray, &reference_gray);

	let megapixels = (reference.width() * reference.height()) as f64;
	println!("Full time: {elapsed:.3} seconds");
	println!("Relative time: {:.3} msec/MP", elapsed / megapixels / 1000.0);
	println!("MSE: {:.3}", metrics.mse);
	println!("PSNR: {:.3}", metrics.psnr);
	println!("Interior MSE: {:.3}", interior.mse);
	println!("Interior PSNR: {:.3}", interior.psnr);
	Ok(())
}
