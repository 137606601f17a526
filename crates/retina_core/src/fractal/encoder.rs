//! Fractal compressor.
//!
//! ## Search
//!
//! For every R-block the encoder scans all downsampled domain windows in all
//! eight orientations and keeps the candidate minimizing an integer
//! closed-form loss of the quantized affine map. The least-squares scale is
//! derived from the block convolution:
//!
//! ```text
//! scale = (R² * conv(r, d) - Σr * Σd) / (R² * Σd² - (Σd)²)
//! ```
//!
//! rejected unless `0 ≤ scale < 1` (the mapping set must stay contractive).
//! A zero denominator means the domain window is flat; the best constant
//! approximation (`scale = 0`, `bias = mean(r)`) competes like any other
//! candidate. Ties break toward the first candidate in raster order, which
//! keeps the output stream reproducible byte for byte.
//!
//! ## Fast mode
//!
//! Each block gets a 4-bit contrast signature: one bit per quadrant, set when
//! the quadrant mean exceeds the block mean. A fixed permutation table maps
//! the signature through each orientation, so a domain window is only
//! convolved when its oriented signature matches the range block's. Range
//! blocks with tiny variance skip the gate — their signature carries no
//! information.

use crate::image::GrayImage;

use super::{BlockMapping, Orientation, constants::IMAGE_SIZE, write_stream};

/// Per-pixel variance below which a range block bypasses the hash gate.
const SMALL_VARIANCE: i32 = 10;

/// Quadrant reading order used by the orientation hash.
const QUADRANT_COUNT: usize = 4;

/// Source quadrant of each hash bit, per orientation.
///
/// Row `o`, column `k`: hash bit `k` of an `o`-oriented block is taken from
/// quadrant `ORIENTATION_HASH_PERMUTATIONS[o][k]` of the upright block
/// (quadrants in reading order: top-left, top-right, bottom-left,
/// bottom-right).
pub(crate) const ORIENTATION_HASH_PERMUTATIONS: [[usize; QUADRANT_COUNT]; Orientation::COUNT] = [
	[0, 1, 2, 3],
	[1, 3, 0, 2],
	[3, 2, 1, 0],
	[2, 0, 3, 1],
	[1, 0, 3, 2],
	[3, 1, 2, 0],
	[2, 3, 0, 1],
	[0, 2, 1, 3],
];

/// Rounded quadrant means and global mean of an n×n block.
pub(crate) fn quadrant_intensities(values: &[u8], n: usize) -> ([i32; QUADRANT_COUNT], i32) {
	let half = n / 2;
	let mut quadrants = [0i32; QUADRANT_COUNT];
	for y in 0..n {
		for x in 0..n {
			let quadrant = usize::from(y >= half) * 2 + usize::from(x >= half);
			quadrants[quadrant] += i32::from(values[y * n + x]);
		}
	}
	let block_area = (n * n) as i32;
	let quadrant_area = (half * half) as i32;
	let mut full = quadrants.iter().sum::<i32>();
	for quadrant in &mut quadrants {
		*quadrant = (*quadrant + quadrant_area / 2) / quadrant_area;
	}
	full = (full + block_area / 2) / block_area;
	(quadrants, full)
}

/// Contrast signature of a block in the given orientation.
pub(crate) fn calculate_hash(
	quadrants: &[i32; QUADRANT_COUNT],
	full_intensity: i32,
	orientation: Orientation,
) -> u8 {
	let permutation = &ORIENTATION_HASH_PERMUTATIONS[orientation as usize];
	let mut hash = 0u8;
	for (bit, &quadrant) in permutation.iter().enumerate() {
		if quadrants[quadrant] > full_intensity {
			hash |= 1 << bit;
		}
	}
	hash
}

/// Convolution of a range block with an oriented downsampled domain block.
fn convolution(r_rows: &[&[u8]], down_d: &[u8], n: usize, orientation: Orientation) -> i32 {
	let mut acc = 0i32;
	for (i, row) in r_rows.iter().enumerate() {
		for (j, &value) in row.iter().enumerate() {
			let (di, dj) = orientation.map(i, j, n);
			acc += i32::from(value) * i32::from(down_d[di * n + dj]);
		}
	}
	acc
}

/// Encoder of a grayscale image into its fractal representation.
#[derive(Debug)]
pub struct Compressor<'a> {
	src: &'a GrayImage,
	r_block_size: usize,
	fast_mode: bool,
	d_blocks_per_side: usize,
	down_d_values: Vec<u8>,
	d_sum_table: Vec<i32>,
	d_square_sum_table: Vec<i32>,
	// One hash per (domain block, orientation); empty outside fast mode.
	hashes: Vec<u8>,
}

impl<'a> Compressor<'a> {
	/// Creates a compressor and precomputes the per-domain tables.
	///
	/// The image must be 256×256 and `r_block_size` must be 4 or 8; anything
	/// else is a caller bug.
	pub fn new(src: &'a GrayImage, r_block_size: usize, fast_mode: bool) -> Self {
		assert_eq!(src.width(), IMAGE_SIZE);
		assert_eq!(src.height(), IMAGE_SIZE);
		assert!(r_block_size == 4 || r_block_size == 8);

		let d_block_size = 2 * r_block_size;
		let d_blocks_per_side = IMAGE_SIZE - d_block_size + 1;

		let mut compressor = Self {
			src,
			r_block_size,
			fast_mode,
			d_blocks_per_side,
			down_d_values: Vec::new(),
			d_sum_table: Vec::new(),
			d_square_sum_table: Vec::new(),
			hashes: Vec::new(),
		};
		compressor.prepare_down_d_values();
		if fast_mode {
			compressor.precalculate_d_hashes();
		}
		compressor
	}

	/// Runs the search and serializes the compressed stream.
	pub fn compress(&self) -> Vec<u8> {
		write_stream(self.r_block_size, &self.find_mappings())
	}

	/// Downsamples every domain window to R×R and tabulates Σ and Σ².
	fn prepare_down_d_values(&mut self) {
		let n = self.r_block_size;
		let r_area = n * n;
		let d_count = self.d_blocks_per_side * self.d_blocks_per_side;
		let buffer = self.src.buffer();

		self.down_d_values = vec![0; r_area * d_count];
		self.d_sum_table = vec![0; d_count];
		self.d_square_sum_table = vec![0; d_count];

		let mut d_index = 0;
		for row in 0..self.d_blocks_per_side {
			for column in 0..self.d_blocks_per_side {
				let block = &mut self.down_d_values[d_index * r_area..(d_index + 1) * r_area];
				let top_left_base = row * IMAGE_SIZE + column;
				let mut sum = 0i32;
				let mut square_sum = 0i32;
				for (index, value) in block.iter_mut().enumerate() {
					let quad = top_left_base + 2 * (index / n) * IMAGE_SIZE + 2 * (index % n);
					let down = (u32::from(buffer[quad])
						+ u32::from(buffer[quad + 1])
						+ u32::from(buffer[quad + IMAGE_SIZE])
						+ u32::from(buffer[quad + IMAGE_SIZE + 1])
						+ 2) / 4;
					*value = down as u8;
					sum += down as i32;
					square_sum += (down * down) as i32;
				}
				self.d_sum_table[d_index] = sum;
				self.d_square_sum_table[d_index] = square_sum;
				d_index += 1;
			}
		}
	}

	/// Hashes every downsampled domain block in all eight orientations.
	fn precalculate_d_hashes(&mut self) {
		let r_area = self.r_block_size * self.r_block_size;
		let d_count = self.d_blocks_per_side * self.d_blocks_per_side;
		self.hashes = vec![0; Orientation::COUNT * d_count];
		for d_index in 0..d_count {
			let block = &self.down_d_values[d_index * r_area..(d_index + 1) * r_area];
			let (quadrants, full_intensity) = quadrant_intensities(block, self.r_block_size);
			for orientation in Orientation::ALL {
				self.hashes[d_index * Orientation::COUNT + orientation as usize] =
					calculate_hash(&quadrants, full_intensity, orientation);
			}
		}
	}

	/// Finds the best mapping for every range block, in raster order.
	fn find_mappings(&self) -> Vec<BlockMapping> {
		let n = self.r_block_size;
		let r_area = (n * n) as i32;
		let r_blocks_per_side = IMAGE_SIZE / n;
		let buffer = self.src.buffer();

		let mut mappings = Vec::with_capacity(r_blocks_per_side * r_blocks_per_side);
		for r_row in 0..r_blocks_per_side {
			for r_column in 0..r_blocks_per_side {
				let base = n * (r_row * IMAGE_SIZE + r_column);
				let r_rows: Vec<&[u8]> =
					(0..n).map(|i| &buffer[base + i * IMAGE_SIZE..base + i * IMAGE_SIZE + n]).collect();

				let mut r_sum = 0i32;
				let mut r_square_sum = 0i32;
				for row in &r_rows {
					for &value in *row {
						r_sum += i32::from(value);
						r_square_sum += i32::from(value) * i32::from(value);
					}
				}
				let r_sum_square = r_sum * r_sum;
				let r_variance_small = (r_square_sum - r_sum_square / r_area) / r_area < SMALL_VARIANCE;
				let r_hash = if self.fast_mode {
					let tile: Vec<u8> = r_rows.iter().flat_map(|row| row.iter().copied()).collect();
					let (quadrants, full_intensity) = quadrant_intensities(&tile, n);
					calculate_hash(&quadrants, full_intensity, Orientation::Rot0)
				} else {
					0
				};

				let mut best = BlockMapping::default();
				let mut min_loss = i32::MAX;
				let mut d_index = 0;
				for d_row in 0..self.d_blocks_per_side {
					for d_column in 0..self.d_blocks_per_side {
						let d_sum = self.d_sum_table[d_index];
						let d_square_sum = self.d_square_sum_table[d_index];
						let denominator = r_area * d_square_sum - d_sum * d_sum;
						if denominator == 0 {
							// Flat domain window: only the constant map is available.
							let loss = r_square_sum - r_sum_square / r_area;
							if loss < min_loss {
								best = BlockMapping {
									top_left_x: d_column as u8,
									top_left_y: d_row as u8,
									orientation: Orientation::Rot0,
									scale: 0,
									bias: (r_sum / r_area).clamp(i32::from(i8::MIN), i32::from(i8::MAX))
										as i8,
								};
								min_loss = loss;
							}
							d_index += 1;
							continue;
						}
						let down =
							&self.down_d_values[d_index * (n * n)..(d_index + 1) * (n * n)];
						let sums_multiplied = d_sum * r_sum;
						for orientation in Orientation::ALL {
							if self.fast_mode
								&& self.hashes[d_index * Orientation::COUNT + orientation as usize]
									!= r_hash && !r_variance_small
							{
								continue;
							}
							let conv = convolution(&r_rows, down, n, orientation);
							let scale_numerator = r_area * conv - sums_multiplied;
							let scale = f64::from(scale_numerator) / f64::from(denominator);
							if !(0.0..1.0).contains(&scale) {
								continue;
							}
							let scale_q = (scale * f64::from(BlockMapping::SCALE_BASE)) as i32;
							let scaled_d_sum = d_sum * scale_q / BlockMapping::SCALE_BASE;
							let bias = ((r_sum - scaled_d_sum) / r_area)
								.clamp(i32::from(i8::MIN), i32::from(i8::MAX));
							let loss = r_square_sum
								+ (d_square_sum * scale_q / BlockMapping::SCALE_BASE - 2 * conv
									+ 2 * bias * d_sum) * scale_q / BlockMapping::SCALE_BASE
								+ bias * (bias * r_area - 2 * r_sum);
							if loss < min_loss {
								best = BlockMapping {
									top_left_x: d_column as u8,
									top_left_y: d_row as u8,
									orientation,
									scale: scale_q as u8,
									bias: bias as i8,
								};
								min_loss = loss;
							}
						}
						d_index += 1;
					}
				}
				mappings.push(best);
			}
		}
		mappings
	}
}
