//! Pyramid adaptive binarization.
//!
//! ## Overview
//!
//! A threshold surface is grown from coarse to fine over min/max/mean
//! pyramids of the input. The surface starts as the mean at the coarsest
//! level; on the way down, wherever the local contrast `max - min` exceeds a
//! noise gate, the surface is overwritten with a mode-dependent local
//! threshold, and between levels it is doubled in resolution with a 9-3-3-1
//! weighted kernel. A pixel binarizes to black iff it is strictly below the
//! surface.
//!
//! ## Size handling
//!
//! The pyramid needs both sides divisible by `2^depth` with
//! `depth = ⌊log₂ min(W, H)⌋ - 1`. Inputs that do not comply are extended by
//! edge-clamped padding split evenly around the image; the output is cropped
//! back to the input size.

mod noise;
mod pyramid;

#[cfg(test)]
mod tests;

use std::fmt::Display;
use std::str::FromStr;

use crate::image::{BitImage, GrayImage};

use noise::deviation_stats;
use pyramid::{PyramidSet, build_pyramids};

const CENTER_WEIGHT: u32 = 9;
const ORTHO_WEIGHT: u32 = 3;
const DIAG_WEIGHT: u32 = 1;
const WEIGHT_SUM: u32 = CENTER_WEIGHT + 2 * ORTHO_WEIGHT + DIAG_WEIGHT;

/// Threshold selection strategy of the binarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinarizationMode {
	/// Threshold at the local average
	Avg,
	/// Threshold midway between local min and max
	#[default]
	Center,
	/// Midpoint pulled toward the local minimum
	CenterMinWeighted,
	/// Mean of the midpoint and the local average
	AvgCenterWeighted,
	/// Midpoint, gated by per-brightness noise statistics instead of a
	/// fixed noise level
	BySeparatedNoiseLevels,
}

impl FromStr for BinarizationMode {
	type Err = String;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name {
			"avg" => Ok(BinarizationMode::Avg),
			"center" => Ok(BinarizationMode::Center),
			"centerMinWeighted" => Ok(BinarizationMode::CenterMinWeighted),
			"avgCenterWeighted" => Ok(BinarizationMode::AvgCenterWeighted),
			"bySeparatedNoiseLevels" => Ok(BinarizationMode::BySeparatedNoiseLevels),
			other => Err(format!("unknown binarization mode: {other}")),
		}
	}
}

impl Display for BinarizationMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			BinarizationMode::Avg => "avg",
			BinarizationMode::Center => "center",
			BinarizationMode::CenterMinWeighted => "centerMinWeighted",
			BinarizationMode::AvgCenterWeighted => "avgCenterWeighted",
			BinarizationMode::BySeparatedNoiseLevels => "bySeparatedNoiseLevels",
		};
		write!(f, "{name}")
	}
}

/// Adaptive binarizer over one grayscale image.
#[derive(Debug)]
pub struct Binarizer<'a> {
	mode: BinarizationMode,
	noise_level: u8,
	sigma_multiplier: f32,
	src: &'a GrayImage,
	depth: usize,
	extended: Option<GrayImage>,
	sigma: [u64; noise::BINS],
}

impl<'a> Binarizer<'a> {
	/// Default noise threshold.
	pub const NOISE_LEVEL: u8 = 40;

	/// Default σ multiplier for [`BinarizationMode::BySeparatedNoiseLevels`].
	pub const SIGMA_MULTIPLIER: f32 = 3.0;

	/// Creates a binarizer.
	///
	/// The image must be at least 4 pixels on its shorter side so the
	/// pyramid has at least one level.
	pub fn new(
		src: &'a GrayImage,
		mode: BinarizationMode,
		noise_level: u8,
		sigma_multiplier: f32,
	) -> Self {
		let min_side = src.width().min(src.height());
		assert!(min_side >= 4, "image too small for a threshold pyramid");
		let depth = min_side.ilog2() as usize - 1;

		let extended = prepare_extended(src, depth);
		let sigma = if mode == BinarizationMode::BySeparatedNoiseLevels {
			deviation_stats(extended.as_ref().unwrap_or(src))
		} else {
			[0; noise::BINS]
		};

		Self {
			mode,
			noise_level,
			sigma_multiplier,
			src,
			depth,
			extended,
			sigma,
		}
	}

	/// Builds the threshold surface and binarizes the image.
	pub fn binarize(self) -> BitImage {
		const BLACK: u8 = 0;
		const WHITE: u8 = 1;

		let working = self.extended.as_ref().unwrap_or(self.src);
		let pyramids = build_pyramids(working, self.depth);
		let threshold_map = self.build_threshold_map(working, &pyramids);

		let ext_width = working.width();
		let top_padding = (working.height() - self.src.height()) / 2;
		let left_padding = (ext_width - self.src.width()) / 2;

		let mut bw = BitImage::new(self.src.width(), self.src.height());
		for y in 0..self.src.height() {
			let map_row = &threshold_map[(y + top_padding) * ext_width + left_padding..];
			for x in 0..self.src.width() {
				let value = if self.src.value(y, x) < map_row[x] {
					BLACK
				} else {
					WHITE
				};
				bw.set_value(y, x, value);
			}
		}
		bw
	}

	/// Grows the threshold surface from the coarsest pyramid level to the
	/// working resolution.
	fn build_threshold_map(&self, working: &GrayImage, pyramids: &PyramidSet) -> Vec<u8> {
		let ext_size = working.width() * working.height();
		let mut prev_map = vec![0u8; ext_size];
		let mut curr_map = vec![0u8; ext_size];

		let coarsest = &pyramids.avg[self.depth - 1];
		curr_map[..coarsest.buffer().len()].copy_from_slice(coarsest.buffer());

		for level in (0..self.depth).rev() {
			let level_width = pyramids.avg[level].width();
			let level_height = pyramids.avg[level].height();
			if level != self.depth - 1 {
				self.refine_map(&mut curr_map[..level_width * level_height], pyramids, level);
			}
			std::mem::swap(&mut prev_map, &mut curr_map);
			upsample(&prev_map, &mut curr_map, level_width, level_height);
		}
		curr_map
	}

	/// Overwrites surface entries whose pyramid cell passes the noise gate
	/// with the mode's local threshold.
	fn refine_map(&self, map: &mut [u8], pyramids: &PyramidSet, level: usize) {
		let min_buffer = pyramids.min[level].buffer();
		let max_buffer = pyramids.max[level].buffer();
		let avg_buffer = pyramids.avg[level].buffer();
		let noise_level = i32::from(self.noise_level);

		for (index, threshold) in map.iter_mut().enumerate() {
			let min_value = i32::from(min_buffer[index]);
			let max_value = i32::from(max_buffer[index]);
			let avg_value = i32::from(avg_buffer[index]);
			match self.mode {
				BinarizationMode::Avg => {
					if max_value - min_value > noise_level {
						*threshold = avg_value as u8;
					}
				}
				BinarizationMode::Center => {
					if max_value - min_value > noise_level {
						*threshold = ((max_value + min_value + 1) / 2) as u8;
					}
				}
				BinarizationMode::CenterMinWeighted => {
					if max_value - min_value > noise_level {
						let med_value = (min_value + max_value) / 2;
						*threshold = ((min_value + med_value * 2 + 1) / 3) as u8;
					}
				}
				BinarizationMode::AvgCenterWeighted => {
					if max_value - min_value > noise_level {
						let med_value = (min_value + max_value) / 2;
						*threshold = ((med_value + avg_value + 1) / 2) as u8;
					}
				}
				BinarizationMode::BySeparatedNoiseLevels => {
					let sigma = self.sigma[(avg_value / 16) as usize];
					let gate = (self.sigma_multiplier * sigma as f32) as i32;
					if max_value - min_value > gate {
						*threshold = ((min_value + max_value) / 2) as u8;
					}
				}
			}
		}
	}
}

/// Doubles the surface resolution with the 9-3-3-1 kernel.
///
/// Each coarse pixel spawns four fine pixels; every fine pixel mixes its
/// coarse owner (9), the two nearest orthogonal coarse neighbors (3 each)
/// and the nearest diagonal one (1), rounding at half the weight sum.
/// Neighbor reads clamp to the surface border.
fn upsample(src_map: &[u8], dst_map: &mut [u8], width: usize, height: usize) {
	let up_width = 2 * width;
	for row in 0..height {
		let prev_row = row.max(1) - 1;
		let next_row = (row + 1).min(height - 1);
		for column in 0..width {
			let prev_column = column.max(1) - 1;
			let next_column = (column + 1).min(width - 1);

			let at = |y: usize, x: usize| u32::from(src_map[y * width + x]);
			let center = CENTER_WEIGHT * at(row, column);
			let north = ORTHO_WEIGHT * at(prev_row, column);
			let south = ORTHO_WEIGHT * at(next_row, column);
			let west = ORTHO_WEIGHT * at(row, prev_column);
			let east = ORTHO_WEIGHT * at(row, next_column);

			let top_left =
				(center + north + west + DIAG_WEIGHT * at(prev_row, prev_column) + WEIGHT_SUM / 2)
					/ WEIGHT_SUM;
			let top_right =
				(center + north + east + DIAG_WEIGHT * at(prev_row, next_column) + WEIGHT_SUM / 2)
					/ WEIGHT_SUM;
			let bot_left =
				(center + south + west + DIAG_WEIGHT * at(next_row, prev_column) + WEIGHT_SUM / 2)
					/ WEIGHT_SUM;
			let bot_right =
				(center + south + east + DIAG_WEIGHT * at(next_row, next_column) + WEIGHT_SUM / 2)
					/ WEIGHT_SUM;

			let up_top = 2 * row * up_width + 2 * column;
			let up_bot = up_top + up_width;
			dst_map[up_top] = top_left as u8;
			dst_map[up_top + 1] = top_right as u8;
			dst_map[up_bot] = bot_left as u8;
			dst_map[up_bot + 1] = bot_right as u8;
		}
	}
}

/// Smallest multiple of `2^depth` not below `side`.
fn divisible_side(side: usize, depth: usize) -> usize {
	let multiplier = 1 << depth;
	let remainder = side % multiplier;
	if remainder == 0 {
		side
	} else {
		side + multiplier - remainder
	}
}

/// Edge-clamped extension to pyramid-friendly dimensions, or `None` when the
/// input already complies.
fn prepare_extended(src: &GrayImage, depth: usize) -> Option<GrayImage> {
	let ext_height = divisible_side(src.height(), depth);
	let ext_width = divisible_side(src.width(), depth);
	if ext_height == src.height() && ext_width == src.width() {
		return None;
	}

	let top_padding = (ext_height - src.height()) / 2;
	let left_padding = (ext_width - src.width()) / 2;
	let mut extended = GrayImage::new(ext_width, ext_height);
	for row in 0..ext_height {
		let src_row = (row.max(top_padding) - top_padding).min(src.height() - 1);
		for column in 0..ext_width {
			let src_column = (column.max(left_padding) - left_padding).min(src.width() - 1);
			extended.set_value(row, column, src.value(src_row, src_column));
		}
	}
	Some(extended)
}
