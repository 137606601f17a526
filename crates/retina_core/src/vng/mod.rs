//! Variable Number of Gradients demosaicing.
//!
//! ## Overview
//!
//! The input is a single-channel Bayer mosaic: the pixel at `(y, x)` carries
//! the green component iff `y + x` is odd; even rows alternate red/green,
//! odd rows green/blue. For every pixel the algorithm computes luminance
//! gradients in the eight compass directions from a 5×5 neighborhood, keeps
//! the directions whose gradient does not exceed an adaptive threshold, and
//! estimates the two missing components from color-difference averages over
//! the kept directions only. Flat areas therefore average widely while edges
//! restrict the average to directions running along the edge.
//!
//! ## Edge handling
//!
//! The engine works on a copy of the mosaic expanded by two rows and columns
//! on every side. The border is mirrored without repeating the edge pixel
//! (column −1 copies column 1, column −2 copies column 2), which keeps the
//! mosaic parity intact; every output pixel is then produced by the regular
//! interpolation path.
//!
//! ## Gradient cache
//!
//! Gradients are cached per source row in fixed rings and shifted down as
//! the scan advances. Only the newly entering bottom row is recomputed per
//! scanline, so the cost per pixel is constant.

mod gradient;

#[cfg(test)]
mod tests;

use crate::image::{GrayImage, RGB_COMPONENTS, RgbComponent, RgbImage, color_cast};

use gradient::{
	LongSlot, RowRing, ShortSlot, calc_horizontal, calc_left_diagonal_long,
	calc_left_diagonal_short, calc_right_diagonal_long, calc_right_diagonal_short, calc_vertical,
};

/// Width of the mirrored border on each side of the expanded mosaic.
const MARGIN: usize = 2;

/// Compass directions of the per-pixel gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
enum Direction {
	North = 0,
	South,
	West,
	East,
	NorthWest,
	NorthEast,
	SouthWest,
	SouthEast,
}

const DIRECTION_COUNT: usize = 8;

/// Cached mosaic rows around the current scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
enum Line {
	BeforePrev = 0,
	Prev,
	Curr,
	Next,
	AfterNext,
}

/// VNG demosaicer over a Bayer-mosaic gray image.
#[derive(Debug)]
pub struct Demosaicer {
	width: usize,
	height: usize,
	ewidth: usize,
	eheight: usize,
	expanded: Vec<u8>,
	vertical: RowRing<3>,
	horizontal: RowRing<3>,
	left_diagonal_long: RowRing<3>,
	right_diagonal_long: RowRing<3>,
	left_diagonal_short: RowRing<4>,
	right_diagonal_short: RowRing<4>,
	direction: [u32; DIRECTION_COUNT],
}

/// Mirror-without-repeat index into `0..size` for an expanded coordinate.
#[inline]
fn reflect(expanded_index: usize, size: usize) -> usize {
	let index = expanded_index as isize - MARGIN as isize;
	if index < 0 {
		(-index) as usize
	} else if index as usize >= size {
		2 * (size - 1) - index as usize
	} else {
		index as usize
	}
}

impl Demosaicer {
	/// Creates a demosaicer over the given mosaic.
	///
	/// The image must be at least 3×3 so the mirrored border is well defined.
	pub fn new(cfa: &GrayImage) -> Self {
		let (width, height) = (cfa.width(), cfa.height());
		assert!(width >= 3 && height >= 3);
		let ewidth = width + 2 * MARGIN;
		let eheight = height + 2 * MARGIN;

		let mut expanded = Vec::with_capacity(ewidth * eheight);
		for ey in 0..eheight {
			let src_row = cfa.row(reflect(ey, height));
			for ex in 0..ewidth {
				expanded.push(src_row[reflect(ex, width)]);
			}
		}

		Self {
			width,
			height,
			ewidth,
			eheight,
			expanded,
			vertical: RowRing::new(ewidth),
			horizontal: RowRing::new(ewidth),
			left_diagonal_long: RowRing::new(ewidth),
			right_diagonal_long: RowRing::new(ewidth),
			left_diagonal_short: RowRing::new(ewidth),
			right_diagonal_short: RowRing::new(ewidth),
			direction: [0; DIRECTION_COUNT],
		}
	}

	/// Recovers the full color image from the mosaic.
	pub fn recover(mut self) -> RgbImage {
		let mut recovered = RgbImage::new(self.width, self.height);
		self.prime_gradients();

		for center in MARGIN..self.eheight - MARGIN {
			self.update_gradients(center);

			let is_red_green_line = center % 2 == 0;
			let green_offset = usize::from(is_red_green_line);
			let other_offset = 1 - green_offset;
			let horizontal_other = if is_red_green_line {
				RgbComponent::Red
			} else {
				RgbComponent::Blue
			};
			let vertical_other = if is_red_green_line {
				RgbComponent::Blue
			} else {
				RgbComponent::Red
			};

			let out_row = recovered.row_mut(center - MARGIN);

			let mut column = MARGIN + green_offset;
			while column < self.ewidth - MARGIN {
				self.calc_direction_gradients_green(column);
				let threshold = self.gradient_threshold();
				self.interpolate_green(center, column, threshold, horizontal_other, vertical_other, out_row);
				column += 2;
			}
			let mut column = MARGIN + other_offset;
			while column < self.ewidth - MARGIN {
				self.calc_direction_gradients_not_green(column);
				let threshold = self.gradient_threshold();
				self.interpolate_not_green(
					center,
					column,
					threshold,
					horizontal_other,
					vertical_other,
					out_row,
				);
				column += 2;
			}
			self.move_cache();
		}
		recovered
	}

	#[inline]
	fn line(&self, center: usize, slot: Line) -> &[u8] {
		let row = center + slot as usize - MARGIN;
		&self.expanded[row * self.ewidth..(row + 1) * self.ewidth]
	}

	/// Fills the cache slots above the first scanline.
	fn prime_gradients(&mut self) {
		let center = MARGIN;
		let ewidth = self.ewidth;
		let line = |slot: Line| {
			let row = center + slot as usize - MARGIN;
			&self.expanded[row * ewidth..(row + 1) * ewidth]
		};

		calc_vertical(
			self.vertical.slot_mut(LongSlot::Top as usize),
			line(Line::BeforePrev),
			line(Line::Curr),
		);
		calc_vertical(
			self.vertical.slot_mut(LongSlot::Mid as usize),
			line(Line::Prev),
			line(Line::Next),
		);
		calc_horizontal(self.horizontal.slot_mut(LongSlot::Top as usize), line(Line::Prev));
		calc_horizontal(self.horizontal.slot_mut(LongSlot::Mid as usize), line(Line::Curr));

		calc_right_diagonal_long(
			self.right_diagonal_long.slot_mut(LongSlot::Top as usize),
			line(Line::BeforePrev),
			line(Line::Curr),
		);
		calc_left_diagonal_long(
			self.left_diagonal_long.slot_mut(LongSlot::Top as usize),
			line(Line::BeforePrev),
			line(Line::Curr),
		);
		calc_right_diagonal_long(
			self.right_diagonal_long.slot_mut(LongSlot::Mid as usize),
			line(Line::Prev),
			line(Line::Next),
		);
		calc_left_diagonal_long(
			self.left_diagonal_long.slot_mut(LongSlot::Mid as usize),
			line(Line::Prev),
			line(Line::Next),
		);

		calc_left_diagonal_short(
			self.left_diagonal_short.slot_mut(ShortSlot::Top as usize),
			line(Line::BeforePrev),
			line(Line::Prev),
		);
		calc_left_diagonal_short(
			self.left_diagonal_short.slot_mut(ShortSlot::MidTop as usize),
			line(Line::Prev),
			line(Line::Curr),
		);
		calc_left_diagonal_short(
			self.left_diagonal_short.slot_mut(ShortSlot::MidBot as usize),
			line(Line::Curr),
			line(Line::Next),
		);
		calc_right_diagonal_short(
			self.right_diagonal_short.slot_mut(ShortSlot::Top as usize),
			line(Line::BeforePrev),
			line(Line::Prev),
		);
		calc_right_diagonal_short(
			self.right_diagonal_short.slot_mut(ShortSlot::MidTop as usize),
			line(Line::Prev),
			line(Line::Curr),
		);
		calc_right_diagonal_short(
			self.right_diagonal_short.slot_mut(ShortSlot::MidBot as usize),
			line(Line::Curr),
			line(Line::Next),
		);
	}

	/// Computes the gradient rows entering the window at the bottom.
	fn update_gradients(&mut self, center: usize) {
		let ewidth = self.ewidth;
		let line = |slot: Line| {
			let row = center + slot as usize - MARGIN;
			&self.expanded[row * ewidth..(row + 1) * ewidth]
		};

		calc_vertical(
			self.vertical.slot_mut(LongSlot::Bot as usize),
			line(Line::Curr),
			line(Line::AfterNext),
		);
		calc_horizontal(self.horizontal.slot_mut(LongSlot::Bot as usize), line(Line::Next));
		calc_left_diagonal_long(
			self.left_diagonal_long.slot_mut(LongSlot::Bot as usize),
			line(Line::Curr),
			line(Line::AfterNext),
		);
		calc_right_diagonal_long(
			self.right_diagonal_long.slot_mut(LongSlot::Bot as usize),
			line(Line::Curr),
			line(Line::AfterNext),
		);
		calc_left_diagonal_short(
			self.left_diagonal_short.slot_mut(ShortSlot::Bot as usize),
			line(Line::Next),
			line(Line::AfterNext),
		);
		calc_right_diagonal_short(
			self.right_diagonal_short.slot_mut(ShortSlot::Bot as usize),
			line(Line::Next),
			line(Line::AfterNext),
		);
	}

	/// Shifts every gradient ring down one scanline.
	fn move_cache(&mut self) {
		self.vertical.advance();
		self.horizontal.advance();
		self.left_diagonal_long.advance();
		self.right_diagonal_long.advance();
		self.left_diagonal_short.advance();
		self.right_diagonal_short.advance();
	}

	/// North/South/West/East gradients; identical for both center types.
	fn calc_non_diagonal_direction_gradients(&mut self, x: usize) {
		let v_top = self.vertical.slot(LongSlot::Top as usize);
		let v_mid = self.vertical.slot(LongSlot::Mid as usize);
		let v_bot = self.vertical.slot(LongSlot::Bot as usize);
		let h_top = self.horizontal.slot(LongSlot::Top as usize);
		let h_mid = self.horizontal.slot(LongSlot::Mid as usize);
		let h_bot = self.horizontal.slot(LongSlot::Bot as usize);
		let at = |row: &[u8], index: usize| u32::from(row[index]);

		self.direction[Direction::North as usize] = at(v_top, x)
			+ at(v_mid, x)
			+ (at(v_top, x - 1) + at(v_mid, x - 1) + at(v_top, x + 1) + at(v_mid, x + 1)) / 2;
		self.direction[Direction::South as usize] = at(v_bot, x)
			+ at(v_mid, x)
			+ (at(v_bot, x - 1) + at(v_mid, x - 1) + at(v_bot, x + 1) + at(v_mid, x + 1)) / 2;
		self.direction[Direction::West as usize] = at(h_mid, x)
			+ at(h_mid, x + 1)
			+ (at(h_top, x) + at(h_top, x + 1) + at(h_bot, x) + at(h_bot, x + 1)) / 2;
		self.direction[Direction::East as usize] = at(h_mid, x + 1)
			+ at(h_mid, x + 2)
			+ (at(h_top, x + 1) + at(h_top, x + 2) + at(h_bot, x + 1) + at(h_bot, x + 2)) / 2;
	}

	/// Diagonal gradients at a green center: four long-diagonal terms each.
	fn calc_direction_gradients_green(&mut self, x: usize) {
		self.calc_non_diagonal_direction_gradients(x);
		let ll_top = self.left_diagonal_long.slot(LongSlot::Top as usize);
		let ll_mid = self.left_diagonal_long.slot(LongSlot::Mid as usize);
		let ll_bot = self.left_diagonal_long.slot(LongSlot::Bot as usize);
		let rl_top = self.right_diagonal_long.slot(LongSlot::Top as usize);
		let rl_mid = self.right_diagonal_long.slot(LongSlot::Mid as usize);
		let rl_bot = self.right_diagonal_long.slot(LongSlot::Bot as usize);
		let at = |row: &[u8], index: usize| u32::from(row[index]);

		self.direction[Direction::NorthWest as usize] =
			at(ll_top, x) + at(ll_top, x + 1) + at(ll_mid, x + 1) + at(ll_mid, x);
		self.direction[Direction::NorthEast as usize] =
			at(rl_mid, x - 1) + at(rl_top, x) + at(rl_top, x - 1) + at(rl_mid, x);
		self.direction[Direction::SouthWest as usize] =
			at(rl_mid, x - 1) + at(rl_bot, x - 2) + at(rl_bot, x - 1) + at(rl_mid, x - 2);
		self.direction[Direction::SouthEast as usize] =
			at(ll_mid, x + 1) + at(ll_mid, x + 2) + at(ll_bot, x + 1) + at(ll_bot, x + 2);
	}

	/// Diagonal gradients at a red/blue center: one long and four halved
	/// short-diagonal terms, relating the center to its green neighbors.
	fn calc_direction_gradients_not_green(&mut self, x: usize) {
		self.calc_non_diagonal_direction_gradients(x);
		let ll_top = self.left_diagonal_long.slot(LongSlot::Top as usize);
		let ll_mid = self.left_diagonal_long.slot(LongSlot::Mid as usize);
		let ll_bot = self.left_diagonal_long.slot(LongSlot::Bot as usize);
		let rl_top = self.right_diagonal_long.slot(LongSlot::Top as usize);
		let rl_mid = self.right_diagonal_long.slot(LongSlot::Mid as usize);
		let rl_bot = self.right_diagonal_long.slot(LongSlot::Bot as usize);
		let ls_top = self.left_diagonal_short.slot(ShortSlot::Top as usize);
		let ls_mid_top = self.left_diagonal_short.slot(ShortSlot::MidTop as usize);
		let ls_mid_bot = self.left_diagonal_short.slot(ShortSlot::MidBot as usize);
		let ls_bot = self.left_diagonal_short.slot(ShortSlot::Bot as usize);
		let rs_top = self.right_diagonal_short.slot(ShortSlot::Top as usize);
		let rs_mid_top = self.right_diagonal_short.slot(ShortSlot::MidTop as usize);
		let rs_mid_bot = self.right_diagonal_short.slot(ShortSlot::MidBot as usize);
		let rs_bot = self.right_diagonal_short.slot(ShortSlot::Bot as usize);
		let at = |row: &[u8], index: usize| u32::from(row[index]);

		self.direction[Direction::NorthWest as usize] = at(ll_mid, x + 1)
			+ at(ll_top, x)
			+ (at(ls_top, x) + at(ls_mid_top, x - 1) + at(ls_mid_top, x + 1) + at(ls_mid_bot, x)) / 2;
		self.direction[Direction::NorthEast as usize] = at(rl_mid, x - 1)
			+ at(rl_top, x)
			+ (at(rs_mid_top, x - 1) + at(rs_mid_top, x + 1) + at(rs_mid_bot, x) + at(rs_top, x)) / 2;
		self.direction[Direction::SouthWest as usize] = at(rl_mid, x - 1)
			+ at(rl_bot, x + 2)
			+ (at(rs_mid_top, x - 1) + at(rs_mid_bot, x - 2) + at(rs_mid_bot, x) + at(rs_bot, x - 1)) / 2;
		self.direction[Direction::SouthEast as usize] = at(ll_mid, x + 1)
			+ at(ll_bot, x + 2)
			+ (at(ls_mid_top, x + 1) + at(ls_mid_bot, x) + at(ls_mid_bot, x + 2) + at(ls_bot, x + 1)) / 2;
	}

	/// Adaptive gradient threshold for the current pixel.
	///
	/// Deliberately `min + max / 2`, not `(min + max) / 2`: the division
	/// applies to the maximum alone.
	fn gradient_threshold(&self) -> u32 {
		let min = *self.direction.iter().min().unwrap_or(&0);
		let max = *self.direction.iter().max().unwrap_or(&0);
		min + max / 2
	}

	/// Interpolates red and blue at a green center pixel.
	fn interpolate_green(
		&self,
		center: usize,
		x: usize,
		threshold: u32,
		horizontal_other: RgbComponent,
		vertical_other: RgbComponent,
		out_row: &mut [u8],
	) {
		let before_prev = self.line(center, Line::BeforePrev);
		let prev = self.line(center, Line::Prev);
		let curr = self.line(center, Line::Curr);
		let next = self.line(center, Line::Next);
		let after_next = self.line(center, Line::AfterNext);
		let at = |row: &[u8], index: usize| i32::from(row[index]);

		let green = RgbComponent::Green as usize;
		let horizontal = horizontal_other as usize;
		let vertical = vertical_other as usize;

		let mut count = 0i32;
		let mut sum = [0i32; RGB_COMPONENTS];

		if self.direction[Direction::NorthWest as usize] <= threshold {
			count += 1;
			sum[green] += at(prev, x - 1);
			sum[horizontal] += (at(prev, x - 2) + at(prev, x)) / 2;
			sum[vertical] += (at(curr, x - 1) + at(before_prev, x - 1)) / 2;
		}
		if self.direction[Direction::NorthEast as usize] <= threshold {
			count += 1;
			sum[green] += at(prev, x + 1);
			sum[horizontal] += (at(prev, x + 2) + at(prev, x)) / 2;
			sum[vertical] += (at(curr, x + 1) + at(before_prev, x + 1)) / 2;
		}
		if self.direction[Direction::SouthWest as usize] <= threshold {
			count += 1;
			sum[green] += at(next, x - 1);
			sum[horizontal] += (at(next, x - 2) + at(next, x)) / 2;
			sum[vertical] += (at(curr, x - 1) + at(after_next, x - 1)) / 2;
		}
		if self.direction[Direction::SouthEast as usize] <= threshold {
			count += 1;
			sum[green] += at(next, x + 1);
			sum[horizontal] += (at(next, x + 2) + at(next, x)) / 2;
			sum[vertical] += (at(curr, x + 1) + at(after_next, x + 1)) / 2;
		}
		if self.direction[Direction::North as usize] <= threshold {
			count += 1;
			sum[vertical] += at(prev, x);
			sum[horizontal] += (at(curr, x - 1)
				+ at(curr, x + 1)
				+ at(before_prev, x - 1)
				+ at(before_prev, x + 1))
				/ 4;
			sum[green] += (at(curr, x) + at(before_prev, x)) / 2;
		}
		if self.direction[Direction::South as usize] <= threshold {
			count += 1;
			// Deliberately next[x - 1], not the next[x] that North symmetry
			// would suggest.
			sum[vertical] += at(next, x - 1);
			sum[horizontal] += (at(curr, x - 1)
				+ at(curr, x + 1)
				+ at(after_next, x - 1)
				+ at(after_next, x + 1))
				/ 4;
			sum[green] += (at(curr, x) + at(after_next, x)) / 2;
		}
		if self.direction[Direction::West as usize] <= threshold {
			count += 1;
			sum[horizontal] += at(curr, x - 1);
			sum[vertical] +=
				(at(prev, x) + at(prev, x - 2) + at(next, x) + at(next, x - 2)) / 4;
			sum[green] += (at(curr, x) + at(curr, x - 2)) / 2;
		}
		if self.direction[Direction::East as usize] <= threshold {
			count += 1;
			sum[horizontal] += at(curr, x + 1);
			sum[vertical] +=
				(at(prev, x) + at(prev, x + 2) + at(next, x) + at(next, x + 2)) / 4;
			sum[green] += (at(curr, x) + at(curr, x + 2)) / 2;
		}

		let center_value = at(curr, x);
		let red = RgbComponent::Red as usize;
		let blue = RgbComponent::Blue as usize;
		let out = &mut out_row[(x - MARGIN) * RGB_COMPONENTS..(x - MARGIN + 1) * RGB_COMPONENTS];
		out[green] = curr[x];
		out[red] = color_cast(center_value + (sum[red] - sum[green]) / count);
		out[blue] = color_cast(center_value + (sum[blue] - sum[green]) / count);
	}

	/// Interpolates green and the opposite color at a red/blue center pixel.
	fn interpolate_not_green(
		&self,
		center: usize,
		x: usize,
		threshold: u32,
		central: RgbComponent,
		other: RgbComponent,
		out_row: &mut [u8],
	) {
		let before_prev = self.line(center, Line::BeforePrev);
		let prev = self.line(center, Line::Prev);
		let curr = self.line(center, Line::Curr);
		let next = self.line(center, Line::Next);
		let after_next = self.line(center, Line::AfterNext);
		let at = |row: &[u8], index: usize| i32::from(row[index]);

		let green = RgbComponent::Green as usize;
		let central_index = central as usize;
		let other_index = other as usize;

		let mut count = 0i32;
		let mut sum = [0i32; RGB_COMPONENTS];

		if self.direction[Direction::NorthWest as usize] <= threshold {
			count += 1;
			sum[other_index] += at(prev, x - 1);
			sum[central_index] += (at(curr, x) + at(before_prev, x - 2)) / 2;
			sum[green] += (at(prev, x - 2)
				+ at(prev, x)
				+ at(curr, x - 1)
				+ at(before_prev, x - 1))
				/ 4;
		}
		if self.direction[Direction::NorthEast as usize] <= threshold {
			count += 1;
			sum[other_index] += at(prev, x + 1);
			sum[central_index] += (at(curr, x) + at(before_prev, x + 2)) / 2;
			sum[green] += (at(prev, x + 2)
				+ at(prev, x)
				+ at(curr, x + 1)
				+ at(before_prev, x + 1))
				/ 4;
		}
		if self.direction[Direction::SouthWest as usize] <= threshold {
			count += 1;
			sum[other_index] += at(next, x - 1);
			sum[central_index] += (at(curr, x) + at(after_next, x - 2)) / 2;
			sum[green] += (at(next, x - 2)
				+ at(next, x)
				+ at(curr, x - 1)
				+ at(after_next, x - 1))
				/ 4;
		}
		if self.direction[Direction::SouthEast as usize] <= threshold {
			count += 1;
			sum[other_index] += at(next, x + 1);
			sum[central_index] += (at(curr, x) + at(after_next, x + 2)) / 2;
			sum[green] += (at(next, x + 2)
				+ at(next, x)
				+ at(curr, x + 1)
				+ at(after_next, x + 1))
				/ 4;
		}
		if self.direction[Direction::North as usize] <= threshold {
			count += 1;
			sum[green] += at(prev, x);
			sum[central_index] += (at(curr, x) + at(before_prev, x)) / 2;
			sum[other_index] += (at(prev, x - 1) + at(prev, x + 1)) / 2;
		}
		if self.direction[Direction::South as usize] <= threshold {
			count += 1;
			sum[green] += at(next, x);
			sum[central_index] += (at(curr, x) + at(after_next, x)) / 2;
			sum[other_index] += (at(next, x - 1) + at(next, x + 1)) / 2;
		}
		if self.direction[Direction::West as usize] <= threshold {
			count += 1;
			sum[green] += at(curr, x - 1);
			sum[central_index] += (at(curr, x - 2) + at(curr, x)) / 2;
			sum[other_index] += (at(prev, x - 1) + at(next, x - 1)) / 2;
		}
		if self.direction[Direction::East as usize] <= threshold {
			count += 1;
			sum[green] += at(curr, x + 1);
			sum[central_index] += (at(curr, x + 2) + at(curr, x)) / 2;
			sum[other_index] += (at(prev, x + 1) + at(next, x + 1)) / 2;
		}

		let center_value = at(curr, x);
		let out = &mut out_row[(x - MARGIN) * RGB_COMPONENTS..(x - MARGIN + 1) * RGB_COMPONENTS];
		out[central_index] = curr[x];
		out[other_index] =
			color_cast(center_value + (sum[other_index] - sum[central_index]) / count);
		out[green] = color_cast(center_value + (sum[green] - sum[central_index]) / count);
	}
}
