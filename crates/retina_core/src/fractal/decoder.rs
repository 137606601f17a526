//! Fractal decompressor.
//!
//! ## Overview
//!
//! Decoding starts from a random 256×256 buffer and applies the full mapping
//! set repeatedly. Each pass reads the previous buffer only: for every range
//! pixel the mapped 2×2 domain quad is averaged, scaled and biased. Because
//! every mapping is contractive the iteration converges to the attractor the
//! encoder built, independently of the random start; eight iterations are
//! plenty in practice.
//!
//! The random initialization is seeded by the caller so decoding stays
//! reproducible in tests and tooling.

use std::path::Path;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::image::{GrayImage, color_cast};

use super::{
	BlockMapping, FractalError, Orientation,
	constants::{HEADER_SIZE, IMAGE_SIZE},
};

/// Decoder of a fractal representation back into a grayscale image.
#[derive(Debug)]
pub struct Decompressor {
	r_block_size: usize,
	mappings: Vec<BlockMapping>,
}

impl Decompressor {
	/// Parses a compressed stream.
	pub fn from_bytes(data: &[u8]) -> Result<Self, FractalError> {
		if data.len() < HEADER_SIZE {
			return Err(FractalError::InsufficientData {
				expected: HEADER_SIZE,
				actual: data.len(),
			});
		}
		let header = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
		if header != 4 && header != 8 {
			return Err(FractalError::InvalidBlockSize(header));
		}
		let r_block_size = header as usize;

		let r_blocks_per_side = IMAGE_SIZE / r_block_size;
		let mappings_count = r_blocks_per_side * r_blocks_per_side;
		let expected = HEADER_SIZE + mappings_count * BlockMapping::SIZE;
		if data.len() < expected {
			return Err(FractalError::InsufficientData {
				expected,
				actual: data.len(),
			});
		}

		let max_top_left = (IMAGE_SIZE - 2 * r_block_size) as u8;
		let mappings = data[HEADER_SIZE..expected]
			.chunks_exact(BlockMapping::SIZE)
			.enumerate()
			.map(|(index, chunk)| {
				let mapping = BlockMapping::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
				if mapping.top_left_x > max_top_left || mapping.top_left_y > max_top_left {
					return Err(FractalError::MappingOutOfRange {
						index,
						x: mapping.top_left_x,
						y: mapping.top_left_y,
					});
				}
				Ok(mapping)
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			r_block_size,
			mappings,
		})
	}

	/// Reads and parses a compressed stream from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, FractalError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Returns the R-block side length of the loaded stream.
	pub fn r_block_size(&self) -> usize {
		self.r_block_size
	}

	/// Returns the loaded mappings in row-major R-block order.
	pub fn mappings(&self) -> &[BlockMapping] {
		&self.mappings
	}

	/// Restores the image with the given number of iterations.
	///
	/// `seed` drives the random initial buffer; the same seed yields the
	/// same output bit for bit.
	pub fn decompress(&self, iterations: usize, seed: u64) -> GrayImage {
		self.decompress_with(iterations, seed, |_, _| {})
	}

	/// Restores the image, handing every intermediate result to `on_iteration`.
	///
	/// The callback receives the iteration index and the buffer state after
	/// that full pass over the mapping set.
	pub fn decompress_with<F>(&self, iterations: usize, seed: u64, mut on_iteration: F) -> GrayImage
	where
		F: FnMut(usize, &GrayImage),
	{
		let mut prev = GrayImage::new(IMAGE_SIZE, IMAGE_SIZE);
		let mut curr = GrayImage::new(IMAGE_SIZE, IMAGE_SIZE);
		let mut rng = SmallRng::seed_from_u64(seed);
		for pixel in curr.buffer_mut() {
			*pixel = rng.random();
		}

		let r_blocks_per_side = IMAGE_SIZE / self.r_block_size;
		for iteration in 0..iterations {
			std::mem::swap(&mut prev, &mut curr);
			let mut mapping_index = 0;
			for r_row in 0..r_blocks_per_side {
				for r_column in 0..r_blocks_per_side {
					self.apply_mapping(&prev, &mut curr, r_row, r_column, self.mappings[mapping_index]);
					mapping_index += 1;
				}
			}
			on_iteration(iteration, &curr);
		}
		curr
	}

	/// Fills one range block of `target` from the mapped domain of `source`.
	fn apply_mapping(
		&self,
		source: &GrayImage,
		target: &mut GrayImage,
		r_row: usize,
		r_column: usize,
		mapping: BlockMapping,
	) {
		let n = self.r_block_size;
		let source = source.buffer();
		let base = usize::from(mapping.top_left_y) * IMAGE_SIZE + usize::from(mapping.top_left_x);
		let scale = i32::from(mapping.scale);
		let bias = i32::from(mapping.bias);

		for i in 0..n {
			for j in 0..n {
				let (di, dj) = mapping.orientation.map(i, j, n);
				let top_left = base + 2 * IMAGE_SIZE * di + 2 * dj;
				let down = (i32::from(source[top_left])
					+ i32::from(source[top_left + 1])
					+ i32::from(source[top_left + IMAGE_SIZE])
					+ i32::from(source[top_left + IMAGE_SIZE + 1])
					+ 2) / 4;
				// +16 rounds the division by the scale base.
				let value = color_cast(
					(down * scale + BlockMapping::SCALE_BASE / 2) / BlockMapping::SCALE_BASE + bias,
				);
				target.set_value(r_row * n + i, r_column * n + j, value);
			}
		}
	}
}
