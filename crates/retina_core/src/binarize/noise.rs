//! Per-intensity-bin noise statistics.
//!
//! For the `BySeparatedNoiseLevels` mode the noise gate is not a fixed
//! threshold but an estimate of the local noise amplitude around the
//! brightness in question. The image is scanned with a 33×33 window; for
//! every position the window variance is computed in O(1) from summed-area
//! tables of values and squared values, and accumulated into one of 16
//! brightness bins keyed by the window mean. The per-bin RMS is the σ the
//! gate multiplies.

use crate::image::GrayImage;

/// Number of brightness bins.
pub(crate) const BINS: usize = 16;

/// Width of one brightness bin.
const VALUES_PER_BIN: u64 = 256 / BINS as u64;

/// Window radius; the window spans `2 * radius + 1` pixels per side, clamped
/// at the image border.
const WINDOW_RADIUS: usize = 16;

/// Estimates σ per brightness bin over the whole image.
///
/// Bins that never saw a window with nonzero variance stay at zero.
pub(crate) fn deviation_stats(image: &GrayImage) -> [u64; BINS] {
	let width = image.width();
	let height = image.height();
	let stride = width + 1;

	// Inclusive-exclusive summed-area tables with a zero guard row/column.
	let mut sum_table = vec![0u64; stride * (height + 1)];
	let mut square_table = vec![0u64; stride * (height + 1)];
	for y in 0..height {
		for x in 0..width {
			let value = u64::from(image.value(y, x));
			let index = (y + 1) * stride + (x + 1);
			sum_table[index] =
				sum_table[index - 1] + sum_table[index - stride] - sum_table[index - stride - 1] + value;
			square_table[index] = square_table[index - 1] + square_table[index - stride]
				- square_table[index - stride - 1]
				+ value * value;
		}
	}

	let rect = |table: &[u64], top: usize, bot: usize, left: usize, right: usize| {
		table[(bot + 1) * stride + right + 1] + table[top * stride + left]
			- table[top * stride + right + 1]
			- table[(bot + 1) * stride + left]
	};

	let mut count_per_bin = [0u64; BINS];
	let mut variance_sum = [0u64; BINS];
	for y in 0..height {
		let top = y.saturating_sub(WINDOW_RADIUS);
		let bot = (y + WINDOW_RADIUS).min(height - 1);
		for x in 0..width {
			let left = x.saturating_sub(WINDOW_RADIUS);
			let right = (x + WINDOW_RADIUS).min(width - 1);
			let pixels = ((bot - top + 1) * (right - left + 1)) as u64;
			let pixels_half = pixels / 2;

			let second_moment = (rect(&square_table, top, bot, left, right) + pixels_half) / pixels;
			let first_moment = (rect(&sum_table, top, bot, left, right) + pixels_half) / pixels;
			let variance = second_moment.saturating_sub(first_moment * first_moment);

			if variance != 0 {
				let bin = (first_moment / VALUES_PER_BIN) as usize;
				count_per_bin[bin] += 1;
				variance_sum[bin] += variance;
			}
		}
	}

	let mut sigma = [0u64; BINS];
	for bin in 0..BINS {
		if count_per_bin[bin] != 0 {
			sigma[bin] = ((variance_sum[bin] / count_per_bin[bin]) as f64).sqrt().round() as u64;
		}
	}
	sigma
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_constant_image_has_no_noise() {
		let image = GrayImage::from_raw(8, 8, vec![77; 64]);
		assert_eq!(deviation_stats(&image), [0; BINS]);
	}

	#[test]
	fn test_checkerboard_concentrates_in_mid_bin() {
		let mut image = GrayImage::new(4, 4);
		for y in 0..4 {
			for x in 0..4 {
				image.set_value(y, x, if (y + x) % 2 == 0 { 0 } else { 255 });
			}
		}
		// Every window covers the whole image: mean 128, variance 127².
		let sigma = deviation_stats(&image);
		for (bin, &value) in sigma.iter().enumerate() {
			assert_eq!(value, if bin == 8 { 127 } else { 0 }, "bin {bin}");
		}
	}
}
