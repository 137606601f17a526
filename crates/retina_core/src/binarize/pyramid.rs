//! Joint min/max/mean pyramid construction.
//!
//! Every level halves both dimensions by collapsing 2×2 tiles of the level
//! below: minimum of four, maximum of four, rounded mean of four. The three
//! pyramids are built together from the same walk.

use crate::image::GrayImage;

/// Min, max and mean pyramids over one source image.
///
/// Level `l` has the resolution `source >> (l + 1)`.
#[derive(Debug)]
pub(crate) struct PyramidSet {
	pub(crate) min: Vec<GrayImage>,
	pub(crate) max: Vec<GrayImage>,
	pub(crate) avg: Vec<GrayImage>,
}

pub(crate) fn build_pyramids(source: &GrayImage, depth: usize) -> PyramidSet {
	let mut set = PyramidSet {
		min: Vec::with_capacity(depth),
		max: Vec::with_capacity(depth),
		avg: Vec::with_capacity(depth),
	};

	for level in 0..depth {
		let (prev_min, prev_max, prev_avg) = if level == 0 {
			(source, source, source)
		} else {
			(&set.min[level - 1], &set.max[level - 1], &set.avg[level - 1])
		};
		let width = prev_min.width() / 2;
		let height = prev_min.height() / 2;

		let mut min_level = GrayImage::new(width, height);
		let mut max_level = GrayImage::new(width, height);
		let mut avg_level = GrayImage::new(width, height);

		for y in 0..height {
			for x in 0..width {
				let tile = |image: &GrayImage| {
					[
						image.value(2 * y, 2 * x),
						image.value(2 * y, 2 * x + 1),
						image.value(2 * y + 1, 2 * x),
						image.value(2 * y + 1, 2 * x + 1),
					]
				};
				let min_tile = tile(prev_min);
				let max_tile = tile(prev_max);
				let avg_tile = tile(prev_avg);
				min_level.set_value(y, x, min_tile.into_iter().min().unwrap_or(0));
				max_level.set_value(y, x, max_tile.into_iter().max().unwrap_or(0));
				let sum: u32 = avg_tile.into_iter().map(u32::from).sum();
				avg_level.set_value(y, x, ((sum + 2) / 4) as u8);
			}
		}

		set.min.push(min_level);
		set.max.push(max_level);
		set.avg.push(avg_level);
	}
	set
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_single_level_reduction() {
		let source = GrayImage::from_raw(4, 2, vec![10, 20, 30, 40, 50, 60, 70, 80]);
		let set = build_pyramids(&source, 1);
		assert_eq!(set.min[0].buffer(), &[10, 30]);
		assert_eq!(set.max[0].buffer(), &[60, 80]);
		// (10 + 20 + 50 + 60 + 2) / 4 and (30 + 40 + 70 + 80 + 2) / 4
		assert_eq!(set.avg[0].buffer(), &[35, 55]);
	}

	#[test]
	fn test_levels_halve_resolution() {
		let source = GrayImage::new(16, 8);
		let set = build_pyramids(&source, 2);
		assert_eq!((set.min[0].width(), set.min[0].height()), (8, 4));
		assert_eq!((set.avg[1].width(), set.avg[1].height()), (4, 2));
	}

	#[test]
	fn test_avg_rounds_up_at_half() {
		let source = GrayImage::from_raw(2, 2, vec![0, 0, 1, 1]);
		let set = build_pyramids(&source, 1);
		// (0 + 0 + 1 + 1 + 2) / 4 rounds to 1.
		assert_eq!(set.avg[0].buffer(), &[1]);
	}
}
