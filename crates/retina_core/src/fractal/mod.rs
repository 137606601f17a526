//! Fractal coding of fixed-size grayscale images.
//!
//! ## Overview
//!
//! The image is partitioned into non-overlapping R×R *range* blocks. For each
//! of them the encoder searches every overlapping 2R×2R *domain* window, in
//! all eight square symmetries, for the affine map `pixel * scale + bias`
//! that best predicts the range block from the downsampled domain block. The
//! compressed representation is nothing but the list of those mappings; the
//! decoder starts from arbitrary pixels and applies the mapping set
//! repeatedly, converging to the encoded attractor because every mapping is
//! contractive (`scale < 1`).
//!
//! ## Compressed stream
//!
//! | Offset | Size | Field                                 |
//! |--------|------|---------------------------------------|
//! | 0x00   | 4    | R-block side length, little-endian    |
//! | 0x04   | 4·N  | mappings, row-major R-block order     |
//!
//! with `N = (256 / R)²`; see [`BlockMapping`] for the 4-byte record layout.

mod decoder;
mod encoder;

#[cfg(test)]
mod tests;

pub use decoder::Decompressor;
pub use encoder::Compressor;

use thiserror::Error;

/// Side length of the images the codec operates on.
pub const IMAGE_SIZE: usize = constants::IMAGE_SIZE;

pub(crate) mod constants {
	/// Side length of the images the codec operates on.
	pub const IMAGE_SIZE: usize = 256;

	/// Size of the stream header (the serialized R-block side).
	pub const HEADER_SIZE: usize = 4;
}

/// Errors that can occur when parsing a compressed fractal stream.
#[derive(Debug, Error)]
pub enum FractalError {
	/// Not enough data to parse
	#[error("Insufficient data: expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// Unsupported R-block side in the header
	#[error("Invalid R-block size {0}: only 4 and 8 are supported")]
	InvalidBlockSize(i32),

	/// A mapping references a domain window outside the image
	#[error("Mapping {index} references domain block at ({x}, {y}) outside the image")]
	MappingOutOfRange {
		/// Index of the offending mapping in the stream
		index: usize,
		/// Domain top-left column
		x: u8,
		/// Domain top-left row
		y: u8,
	},

	/// IO error
	#[error(transparent)]
	IOError(#[from] std::io::Error),
}

/// Orientation of a domain block relative to the range block it predicts.
///
/// The eight elements of the square's symmetry group. Rotations are
/// clockwise; the mirrored variants flip along the vertical axis before
/// rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Orientation {
	/// Identity
	#[default]
	Rot0 = 0,
	/// Quarter turn
	Rot90 = 1,
	/// Half turn
	Rot180 = 2,
	/// Three-quarter turn
	Rot270 = 3,
	/// Mirror
	MirroredRot0 = 4,
	/// Mirror, then quarter turn
	MirroredRot90 = 5,
	/// Mirror, then half turn
	MirroredRot180 = 6,
	/// Mirror, then three-quarter turn
	MirroredRot270 = 7,
}

impl Orientation {
	/// Number of orientations.
	pub const COUNT: usize = 8;

	/// All orientations, in tag order.
	pub const ALL: [Orientation; Orientation::COUNT] = [
		Orientation::Rot0,
		Orientation::Rot90,
		Orientation::Rot180,
		Orientation::Rot270,
		Orientation::MirroredRot0,
		Orientation::MirroredRot90,
		Orientation::MirroredRot180,
		Orientation::MirroredRot270,
	];

	/// Reconstructs an orientation from its 3-bit tag.
	pub fn from_tag(tag: u8) -> Self {
		Orientation::ALL[(tag & 0x07) as usize]
	}

	/// Returns the 3-bit tag of this orientation.
	pub fn tag(self) -> u8 {
		self as u8
	}

	/// Maps a position of an n×n block in reading order to the position it
	/// is fetched from in a block of this orientation.
	///
	/// This single index transform drives both the encoder's convolution and
	/// the decoder's domain addressing, so the two stay consistent by
	/// construction.
	pub fn map(self, i: usize, j: usize, n: usize) -> (usize, usize) {
		match self {
			Orientation::Rot0 => (i, j),
			Orientation::Rot90 => (j, n - 1 - i),
			Orientation::Rot180 => (n - 1 - i, n - 1 - j),
			Orientation::Rot270 => (n - 1 - j, i),
			Orientation::MirroredRot0 => (i, n - 1 - j),
			Orientation::MirroredRot90 => (n - 1 - j, n - 1 - i),
			Orientation::MirroredRot180 => (n - 1 - i, j),
			Orientation::MirroredRot270 => (j, i),
		}
	}
}

/// One contractive range-to-domain mapping, serialized in exactly 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockMapping {
	/// Column of the matched domain window's top-left corner
	pub top_left_x: u8,
	/// Row of the matched domain window's top-left corner
	pub top_left_y: u8,
	/// Domain block orientation
	pub orientation: Orientation,
	/// Brightness scale, quantized to `scale / 32` with `scale < 32`
	pub scale: u8,
	/// Brightness bias
	pub bias: i8,
}

impl BlockMapping {
	/// Size of a serialized mapping in bytes.
	pub const SIZE: usize = 4;

	/// Quantization base of the brightness scale.
	pub const SCALE_BASE: i32 = 32;

	/// Serializes the mapping.
	///
	/// The third byte packs orientation and scale explicitly as
	/// `(orientation & 0x07) | ((scale & 0x1F) << 3)` so the layout does not
	/// depend on how any particular compiler orders bitfields.
	pub fn to_bytes(self) -> [u8; Self::SIZE] {
		[
			self.top_left_x,
			self.top_left_y,
			(self.orientation.tag() & 0x07) | ((self.scale & 0x1F) << 3),
			self.bias as u8,
		]
	}

	/// Deserializes a mapping.
	pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
		Self {
			top_left_x: bytes[0],
			top_left_y: bytes[1],
			orientation: Orientation::from_tag(bytes[2] & 0x07),
			scale: (bytes[2] >> 3) & 0x1F,
			bias: bytes[3] as i8,
		}
	}
}

/// Serializes a full compressed stream: header plus mappings.
pub(crate) fn write_stream(r_block_size: usize, mappings: &[BlockMapping]) -> Vec<u8> {
	let mut stream = Vec::with_capacity(constants::HEADER_SIZE + mappings.len() * BlockMapping::SIZE);
	stream.extend_from_slice(&(r_block_size as i32).to_le_bytes());
	for mapping in mappings {
		stream.extend_from_slice(&mapping.to_bytes());
	}
	stream
}
