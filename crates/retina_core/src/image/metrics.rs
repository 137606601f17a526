//! Luma transform and reconstruction quality metrics.
//!
//! The gray value of a color pixel is computed in integer arithmetic with
//! 15-bit fixed-point weights:
//!
//! | Component | Weight | Fixed-point (`weight * 2^15`) |
//! |-----------|--------|-------------------------------|
//! | Red       | 0.299  | 9798                          |
//! | Green     | 0.587  | 19235                         |
//! | Blue      | 0.114  | 3735                          |

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use super::{GrayImage, RGB_COMPONENTS, RgbComponent, RgbImage};

const DENOMINATOR_BITS: u32 = 15;
const RED_WEIGHT: u32 = 9798;
const GREEN_WEIGHT: u32 = 19235;
const BLUE_WEIGHT: u32 = 3735;

/// Computes the luma (Y) value of a color pixel.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
	((RED_WEIGHT * u32::from(r) + GREEN_WEIGHT * u32::from(g) + BLUE_WEIGHT * u32::from(b))
		>> DENOMINATOR_BITS) as u8
}

/// Converts a color image to grayscale through the luma transform.
pub fn to_gray(color: &RgbImage) -> GrayImage {
	let mut gray = GrayImage::new(color.width(), color.height());
	for (gray_value, pixel) in gray
		.buffer_mut()
		.iter_mut()
		.zip(color.buffer().chunks_exact(RGB_COMPONENTS))
	{
		*gray_value = luma(
			pixel[RgbComponent::Red as usize],
			pixel[RgbComponent::Green as usize],
			pixel[RgbComponent::Blue as usize],
		);
	}
	gray
}

/// Reconstruction quality of an image against a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
	/// Mean squared error
	pub mse: f64,
	/// Peak signal-to-noise ratio, in dB
	pub psnr: f64,
}

impl Metrics {
	fn from_mse(mse: f64) -> Self {
		let psnr = 10.0 * (255.0f64.powi(2) / mse).log10();
		Self {
			mse,
			psnr,
		}
	}

	/// Writes the metrics to a plain-text file.
	pub fn save_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
		let mut out = std::fs::File::create(path)?;
		write!(out, "{self}")
	}
}

impl Display for Metrics {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "MSE = {:.3}", self.mse)?;
		writeln!(f, "PSNR = {:.3}", self.psnr)
	}
}

/// Computes MSE and PSNR over the whole frame.
pub fn calculate_metrics(recovered: &GrayImage, reference: &GrayImage) -> Metrics {
	assert_eq!(recovered.width(), reference.width());
	assert_eq!(recovered.height(), reference.height());
	let size = (recovered.width() * recovered.height()) as f64;
	let mse = recovered
		.buffer()
		.iter()
		.zip(reference.buffer())
		.map(|(&a, &b)| f64::from(i32::from(a) - i32::from(b)).powi(2))
		.sum::<f64>()
		/ size;
	Metrics::from_mse(mse)
}

/// Computes MSE and PSNR with a 2-pixel border excluded on every side.
///
/// Useful for judging a demosaicer independently of its edge handling.
pub fn calculate_metrics_cropped(recovered: &GrayImage, reference: &GrayImage) -> Metrics {
	assert_eq!(recovered.width(), reference.width());
	assert_eq!(recovered.height(), reference.height());
	let (width, height) = (recovered.width(), recovered.height());
	assert!(width > 4 && height > 4);
	let mut mse = 0.0;
	for y in 2..height - 2 {
		for x in 2..width - 2 {
			mse += f64::from(i32::from(recovered.value(y, x)) - i32::from(reference.value(y, x)))
				.powi(2);
		}
	}
	mse /= ((height - 2) * (width - 2)) as f64;
	Metrics::from_mse(mse)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_luma_primaries() {
		assert_eq!(luma(255, 0, 0), 76);
		assert_eq!(luma(0, 255, 0), 149);
		assert_eq!(luma(0, 0, 255), 29);
		assert_eq!(luma(255, 255, 255), 255);
		assert_eq!(luma(0, 0, 0), 0);
	}

	#[test]
	fn test_metrics_identical_images() {
		let gray = GrayImage::from_raw(3, 3, vec![7; 9]);
		let metrics = calculate_metrics(&gray, &gray.clone());
		assert_eq!(metrics.mse, 0.0);
		assert!(metrics.psnr.is_infinite());
	}

	#[test]
	fn test_metrics_known_difference() {
		let a = GrayImage::from_raw(2, 2, vec![10, 10, 10, 10]);
		let b = GrayImage::from_raw(2, 2, vec![10, 10, 10, 14]);
		let metrics = calculate_metrics(&a, &b);
		assert_eq!(metrics.mse, 4.0);
	}

	#[test]
	fn test_cropped_metrics_ignore_border() {
		let mut a = GrayImage::new(6, 6);
		let b = GrayImage::new(6, 6);
		// Damage only the border ring; the interior stays equal.
		a.set_value(0, 0, 200);
		a.set_value(5, 5, 200);
		let metrics = calculate_metrics_cropped(&a, &b);
		assert_eq!(metrics.mse, 0.0);
	}

	#[test]
	fn test_to_gray_uses_bgr_order() {
		let color = RgbImage::from_raw(1, 1, vec![255, 0, 0]);
		assert_eq!(to_gray(&color).value(0, 0), 29);
	}
}
