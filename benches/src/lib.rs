//! Benchmark helper utilities for `retina-rs`.
//!
//! The engines are pure functions of their input buffers, so the benchmark
//! suite runs entirely on synthetic images: a Bayer mosaic of a smooth
//! two-tone scene for the demosaicer, a smooth ramp for the fractal codec
//! and a noisy text-like page for the binarizer.

use retina_core::GrayImage;
use retina_core::fractal;

/// Side length of the fractal codec's fixed frame.
pub const FRACTAL_SIDE: usize = fractal::IMAGE_SIZE;

/// Cheap deterministic pseudo-random byte per position.
pub fn noise(y: usize, x: usize) -> u8 {
	let mut value = (y.wrapping_mul(2654435761) ^ x.wrapping_mul(40503)) as u32;
	value ^= value >> 15;
	value = value.wrapping_mul(2246822519);
	(value >> 24) as u8
}

/// A smooth diagonal ramp; fractal coding reconstructs it almost exactly.
pub fn ramp_image(width: usize, height: usize) -> GrayImage {
	let mut image = GrayImage::new(width, height);
	for y in 0..height {
		for x in 0..width {
			image.set_value(y, x, ((x + y) / 2) as u8);
		}
	}
	image
}

/// A Bayer mosaic of a soft two-tone scene with mild sensor noise.
pub fn mosaic_image(width: usize, height: usize) -> GrayImage {
	let mut image = GrayImage::new(width, height);
	for y in 0..height {
		for x in 0..width {
			let base = if (x / 32 + y / 32) % 2 == 0 { 80 } else { 170 };
			let value = base + i32::from(noise(y, x) % 16) - 8;
			image.set_value(y, x, value.clamp(0, 255) as u8);
		}
	}
	image
}

/// A text-like page: dark glyph blobs on a bright, slightly noisy ground.
pub fn page_image(width: usize, height: usize) -> GrayImage {
	let mut image = GrayImage::new(width, height);
	for y in 0..height {
		for x in 0..width {
			let glyph = (x % 16 < 6) && (y % 12 < 7) && ((x / 16 + y / 12) % 3 != 0);
			let value = if glyph { 30 + noise(y, x) % 24 } else { 200 + noise(y, x) % 40 };
			image.set_value(y, x, value);
		}
	}
	image
}
