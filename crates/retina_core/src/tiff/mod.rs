//! Bilevel TIFF output.
//!
//! ## Overview
//!
//! A minimal classic (little-endian, 32-bit offset) TIFF writer for 1-bit
//! images, one strip per row, each strip compressed with CCITT Group 3
//! one-dimensional coding (see [`fax`](self)). Only the writing side exists;
//! the engines never read TIFF.
//!
//! ## File layout
//!
//! | Section         | Content                                    |
//! |-----------------|--------------------------------------------|
//! | Header          | `II`, magic 42, IFD offset                 |
//! | Strip data      | one G3-coded strip per image row           |
//! | IFD             | 13 entries, sorted by tag                  |
//! | External values | strip offsets/byte counts, resolutions     |

mod fax;

use std::io::Write;
use std::path::Path;

use crate::image::BitImage;

mod tags {
	pub const IMAGE_WIDTH: u16 = 256;
	pub const IMAGE_LENGTH: u16 = 257;
	pub const BITS_PER_SAMPLE: u16 = 258;
	pub const COMPRESSION: u16 = 259;
	pub const PHOTOMETRIC: u16 = 262;
	pub const FILL_ORDER: u16 = 266;
	pub const STRIP_OFFSETS: u16 = 273;
	pub const SAMPLES_PER_PIXEL: u16 = 277;
	pub const ROWS_PER_STRIP: u16 = 278;
	pub const STRIP_BYTE_COUNTS: u16 = 279;
	pub const X_RESOLUTION: u16 = 282;
	pub const Y_RESOLUTION: u16 = 283;
	pub const RESOLUTION_UNIT: u16 = 296;

	pub const TYPE_SHORT: u16 = 3;
	pub const TYPE_LONG: u16 = 4;
	pub const TYPE_RATIONAL: u16 = 5;

	pub const COMPRESSION_CCITT_FAX3: u16 = 3;
	pub const PHOTOMETRIC_MIN_IS_BLACK: u16 = 1;
	pub const FILL_ORDER_MSB2LSB: u16 = 1;
	pub const RESOLUTION_UNIT_INCH: u16 = 2;
}

const HEADER_SIZE: u32 = 8;
const ENTRY_COUNT: u16 = 13;
const DOTS_PER_INCH: u32 = 300;

/// One 12-byte IFD entry.
fn ifd_entry(tag: u16, field_type: u16, count: u32, value: u32) -> [u8; 12] {
	let mut entry = [0u8; 12];
	entry[0..2].copy_from_slice(&tag.to_le_bytes());
	entry[2..4].copy_from_slice(&field_type.to_le_bytes());
	entry[4..8].copy_from_slice(&count.to_le_bytes());
	entry[8..12].copy_from_slice(&value.to_le_bytes());
	entry
}

/// A SHORT value sits left-aligned in the 4-byte value field.
fn short_value(value: u16) -> u32 {
	u32::from(value)
}

/// Saves a 1-bit image as a Group 3 compressed TIFF.
pub fn save_bilevel(path: impl AsRef<Path>, image: &BitImage) -> std::io::Result<()> {
	let height = image.height();
	let strips: Vec<Vec<u8>> = (0..height).map(|y| fax::encode_row(image.row(y))).collect();

	// Strip data sits right after the header; the IFD follows, word-aligned.
	let mut strip_offsets = Vec::with_capacity(height);
	let mut offset = HEADER_SIZE;
	for strip in &strips {
		strip_offsets.push(offset);
		offset += strip.len() as u32;
	}
	let padding = usize::from(offset % 2 == 1);
	let ifd_offset = offset + padding as u32;
	let ifd_size = 2 + u32::from(ENTRY_COUNT) * 12 + 4;

	// External value arrays follow the IFD.
	let mut external_offset = ifd_offset + ifd_size;
	let mut external = Vec::new();
	let mut array_or_inline = |values: &[u32]| {
		if values.len() == 1 {
			values[0]
		} else {
			let array_offset = external_offset;
			for value in values {
				external.extend_from_slice(&value.to_le_bytes());
			}
			external_offset += 4 * values.len() as u32;
			array_offset
		}
	};
	let strip_offsets_value = array_or_inline(&strip_offsets);
	let strip_counts: Vec<u32> = strips.iter().map(|strip| strip.len() as u32).collect();
	let strip_counts_value = array_or_inline(&strip_counts);
	let x_resolution_value = array_or_inline(&[DOTS_PER_INCH, 1]);
	let y_resolution_value = array_or_inline(&[DOTS_PER_INCH, 1]);

	let entries = [
		ifd_entry(tags::IMAGE_WIDTH, tags::TYPE_LONG, 1, image.width() as u32),
		ifd_entry(tags::IMAGE_LENGTH, tags::TYPE_LONG, 1, height as u32),
		ifd_entry(tags::BITS_PER_SAMPLE, tags::TYPE_SHORT, 1, short_value(1)),
		ifd_entry(
			tags::COMPRESSION,
			tags::TYPE_SHORT,
			1,
			short_value(tags::COMPRESSION_CCITT_FAX3),
		),
		ifd_entry(
			tags::PHOTOMETRIC,
			tags::TYPE_SHORT,
			1,
			short_value(tags::PHOTOMETRIC_MIN_IS_BLACK),
		),
		ifd_entry(
			tags::FILL_ORDER,
			tags::TYPE_SHORT,
			1,
			short_value(tags::FILL_ORDER_MSB2LSB),
		),
		ifd_entry(tags::STRIP_OFFSETS, tags::TYPE_LONG, height as u32, strip_offsets_value),
		ifd_entry(tags::SAMPLES_PER_PIXEL, tags::TYPE_SHORT, 1, short_value(1)),
		ifd_entry(tags::ROWS_PER_STRIP, tags::TYPE_LONG, 1, 1),
		ifd_entry(tags::STRIP_BYTE_COUNTS, tags::TYPE_LONG, height as u32, strip_counts_value),
		ifd_entry(tags::X_RESOLUTION, tags::TYPE_RATIONAL, 1, x_resolution_value),
		ifd_entry(tags::Y_RESOLUTION, tags::TYPE_RATIONAL, 1, y_resolution_value),
		ifd_entry(
			tags::RESOLUTION_UNIT,
			tags::TYPE_SHORT,
			1,
			short_value(tags::RESOLUTION_UNIT_INCH),
		),
	];

	let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
	out.write_all(b"II")?;
	out.write_all(&42u16.to_le_bytes())?;
	out.write_all(&ifd_offset.to_le_bytes())?;
	for strip in &strips {
		out.write_all(strip)?;
	}
	if padding == 1 {
		out.write_all(&[0])?;
	}
	out.write_all(&ENTRY_COUNT.to_le_bytes())?;
	for entry in &entries {
		out.write_all(entry)?;
	}
	out.write_all(&0u32.to_le_bytes())?;
	out.write_all(&external)?;
	out.flush()
}
