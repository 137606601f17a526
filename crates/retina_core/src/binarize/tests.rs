//! Unit tests for the pyramid binarizer.

use super::*;

fn image_from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> GrayImage {
	let mut image = GrayImage::new(width, height);
	for y in 0..height {
		for x in 0..width {
			image.set_value(y, x, f(y, x));
		}
	}
	image
}

fn checkerboard(side: usize) -> GrayImage {
	image_from_fn(side, side, |y, x| if (y + x) % 2 == 0 { 0 } else { 255 })
}

#[test]
fn test_mode_names_roundtrip() {
	for mode in [
		BinarizationMode::Avg,
		BinarizationMode::Center,
		BinarizationMode::CenterMinWeighted,
		BinarizationMode::AvgCenterWeighted,
		BinarizationMode::BySeparatedNoiseLevels,
	] {
		assert_eq!(mode.to_string().parse::<BinarizationMode>(), Ok(mode));
	}
	assert!("median".parse::<BinarizationMode>().is_err());
}

#[test]
fn test_checkerboard_binarizes_to_itself() {
	// Black and white input with the gate wide open reproduces the input:
	// the surface settles at 128 everywhere.
	let input = checkerboard(8);
	let bw = Binarizer::new(&input, BinarizationMode::Center, 0, 3.0).binarize();
	for y in 0..8 {
		for x in 0..8 {
			assert_eq!(bw.value(y, x), input.value(y, x) / 255, "({y}, {x})");
		}
	}
}

#[test]
fn test_constant_input_is_all_white() {
	for value in [0u8, 128, 255] {
		let input = image_from_fn(8, 8, |_, _| value);
		let bw = Binarizer::new(&input, BinarizationMode::Center, 40, 3.0).binarize();
		assert!(bw.row(0).iter().all(|&pixel| pixel == 1), "value {value}");
		assert!((0..8).all(|y| bw.row(y).iter().all(|&pixel| pixel == 1)), "value {value}");
	}
}

#[test]
fn test_split_field_rows() {
	// Top half 0, bottom half 255. The surface interpolates from 0 up to
	// 255 between the halves; a flat region always equals its own threshold
	// and therefore reads as white, so the first row stays white while the
	// remaining top rows go black.
	let input = image_from_fn(8, 8, |y, _| if y < 4 { 0 } else { 255 });
	let bw = Binarizer::new(&input, BinarizationMode::Center, 10, 3.0).binarize();
	for x in 0..8 {
		assert_eq!(bw.value(0, x), 1, "row 0, column {x}");
		for y in 1..4 {
			assert_eq!(bw.value(y, x), 0, "row {y}, column {x}");
		}
		for y in 4..8 {
			assert_eq!(bw.value(y, x), 1, "row {y}, column {x}");
		}
	}
}

#[test]
fn test_separated_noise_levels_on_checkerboard() {
	// σ of the mid bin is 127, so the gate needs a contrast above 381 and
	// never fires; the surface still settles at the coarsest average 128.
	let input = checkerboard(8);
	let bw =
		Binarizer::new(&input, BinarizationMode::BySeparatedNoiseLevels, 40, 3.0).binarize();
	for y in 0..8 {
		for x in 0..8 {
			assert_eq!(bw.value(y, x), input.value(y, x) / 255, "({y}, {x})");
		}
	}
}

#[test]
fn test_non_divisible_input_is_extended_and_cropped() {
	let input = image_from_fn(10, 6, |y, x| (20 * y + x) as u8);
	let binarizer = Binarizer::new(&input, BinarizationMode::Center, 40, 3.0);
	// depth 1 wants multiples of 2; 10×6 already complies.
	assert!(binarizer.extended.is_none());
	let bw = binarizer.binarize();
	assert_eq!((bw.width(), bw.height()), (10, 6));

	let input = image_from_fn(9, 17, |y, x| (10 * y + x) as u8);
	let binarizer = Binarizer::new(&input, BinarizationMode::Center, 40, 3.0);
	// depth 2 wants multiples of 4: 9×17 extends to 12×20.
	let extended = binarizer.extended.as_ref().expect("padding expected");
	assert_eq!((extended.width(), extended.height()), (12, 20));
	// Padding splits evenly and clamps to the nearest source pixel.
	assert_eq!(extended.value(0, 0), input.value(0, 0));
	assert_eq!(extended.value(19, 11), input.value(16, 8));
	let bw = binarizer.binarize();
	assert_eq!((bw.width(), bw.height()), (9, 17));
}

#[test]
fn test_divisible_side() {
	assert_eq!(divisible_side(256, 7), 256);
	assert_eq!(divisible_side(300, 3), 304);
	assert_eq!(divisible_side(5, 1), 6);
}

#[test]
fn test_upsample_keeps_flat_surface_flat() {
	let src = vec![100u8; 4];
	let mut dst = vec![0u8; 16];
	upsample(&src, &mut dst, 2, 2);
	assert!(dst.iter().all(|&value| value == 100));
}

#[test]
fn test_upsample_kernel_weights() {
	// 2×2 surface [[0, 64], [191, 255]]; the top-left fine pixel of the
	// top-left coarse pixel clamps every neighbor to itself.
	let src = vec![0u8, 64, 191, 255];
	let mut dst = vec![0u8; 16];
	upsample(&src, &mut dst, 2, 2);
	assert_eq!(dst[0], 0);
	// Bottom-right fine pixel of the top-left coarse pixel mixes all four:
	// (9*0 + 3*64 + 3*191 + 1*255 + 8) / 16 = 64.
	assert_eq!(dst[5], 64);
}
