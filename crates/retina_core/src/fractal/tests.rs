//! Unit tests for the fractal codec.

use super::encoder::{ORIENTATION_HASH_PERMUTATIONS, calculate_hash, quadrant_intensities};
use super::*;
use crate::image::GrayImage;

fn constant_image(value: u8) -> GrayImage {
	GrayImage::from_raw(
		constants::IMAGE_SIZE,
		constants::IMAGE_SIZE,
		vec![value; constants::IMAGE_SIZE * constants::IMAGE_SIZE],
	)
}

fn constant_stream(r_block_size: usize, bias: i8) -> Vec<u8> {
	let per_side = constants::IMAGE_SIZE / r_block_size;
	let mapping = BlockMapping {
		bias,
		..BlockMapping::default()
	};
	write_stream(r_block_size, &vec![mapping; per_side * per_side])
}

#[test]
fn test_orientation_tag_roundtrip() {
	for orientation in Orientation::ALL {
		assert_eq!(Orientation::from_tag(orientation.tag()), orientation);
	}
}

#[test]
fn test_orientation_group_laws() {
	let n = 4;
	for i in 0..n {
		for j in 0..n {
			// A quarter turn has order four.
			let mut position = (i, j);
			for _ in 0..4 {
				position = Orientation::Rot90.map(position.0, position.1, n);
			}
			assert_eq!(position, (i, j));

			// A half turn and every mirrored variant are involutions.
			for orientation in [
				Orientation::Rot180,
				Orientation::MirroredRot0,
				Orientation::MirroredRot90,
				Orientation::MirroredRot180,
				Orientation::MirroredRot270,
			] {
				let once = orientation.map(i, j, n);
				assert_eq!(orientation.map(once.0, once.1, n), (i, j), "{orientation:?}");
			}
		}
	}
}

#[test]
fn test_orientation_map_quarter_turn() {
	// 2×2 block in reading order: positions (i, j) fetch from (j, 1 - i).
	assert_eq!(Orientation::Rot90.map(0, 0, 2), (0, 1));
	assert_eq!(Orientation::Rot90.map(0, 1, 2), (1, 1));
	assert_eq!(Orientation::Rot90.map(1, 0, 2), (0, 0));
	assert_eq!(Orientation::Rot90.map(1, 1, 2), (1, 0));
}

#[test]
fn test_mapping_byte_layout() {
	let mapping = BlockMapping {
		top_left_x: 3,
		top_left_y: 200,
		orientation: Orientation::MirroredRot90,
		scale: 17,
		bias: -5,
	};
	let bytes = mapping.to_bytes();
	assert_eq!(bytes[0], 3);
	assert_eq!(bytes[1], 200);
	// Orientation in the low 3 bits, scale in the high 5.
	assert_eq!(bytes[2], 5 | (17 << 3));
	assert_eq!(bytes[3], (-5i8) as u8);
	assert_eq!(BlockMapping::from_bytes(bytes), mapping);
}

#[test]
fn test_hash_permutation_table() {
	assert_eq!(
		ORIENTATION_HASH_PERMUTATIONS,
		[
			[0, 1, 2, 3],
			[1, 3, 0, 2],
			[3, 2, 1, 0],
			[2, 0, 3, 1],
			[1, 0, 3, 2],
			[3, 1, 2, 0],
			[2, 3, 0, 1],
			[0, 2, 1, 3]
		]
	);
}

#[test]
fn test_quadrant_hash_contrast_pattern() {
	// 4×4 block, bright top-left quadrant only.
	#[rustfmt::skip]
	let block = [
		200, 200, 10, 10,
		200, 200, 10, 10,
		10, 10, 10, 10,
		10, 10, 10, 10,
	];
	let (quadrants, full) = quadrant_intensities(&block, 4);
	assert_eq!(quadrants, [200, 10, 10, 10]);
	assert_eq!(full, 58); // (920 + 8) / 16
	assert_eq!(calculate_hash(&quadrants, full, Orientation::Rot0), 0b0001);
	// A half turn moves the bright quadrant to the bottom-right bit.
	assert_eq!(calculate_hash(&quadrants, full, Orientation::Rot180), 0b1000);
}

#[test]
fn test_constant_image_compresses_to_flat_mappings() {
	let stream = Compressor::new(&constant_image(90), 8, false).compress();
	assert_eq!(stream.len(), 4 + 4 * (256 / 8) * (256 / 8));
	assert_eq!(&stream[..4], &8i32.to_le_bytes());

	let decoder = Decompressor::from_bytes(&stream).unwrap();
	for mapping in decoder.mappings() {
		assert_eq!(
			*mapping,
			BlockMapping {
				top_left_x: 0,
				top_left_y: 0,
				orientation: Orientation::Rot0,
				scale: 0,
				bias: 90,
			}
		);
	}
}

#[test]
fn test_constant_mid_gray_bias_clamps_to_i8_range() {
	// A constant 128 asks for a flat bias of 128, one past what the mapping's
	// i8 field can hold; the encoder clamps it to 127.
	let stream = Compressor::new(&constant_image(128), 4, false).compress();
	let decoder = Decompressor::from_bytes(&stream).unwrap();
	assert_eq!(decoder.mappings().len(), (256 / 4) * (256 / 4));
	for mapping in decoder.mappings() {
		assert_eq!(
			*mapping,
			BlockMapping {
				top_left_x: 0,
				top_left_y: 0,
				orientation: Orientation::Rot0,
				scale: 0,
				bias: 127,
			}
		);
	}
}

#[test]
fn test_fast_mode_matches_normal_mode_on_constant_input() {
	let image = constant_image(33);
	let normal = Compressor::new(&image, 8, false).compress();
	let fast = Compressor::new(&image, 8, true).compress();
	assert_eq!(normal, fast);
}

#[test]
fn test_constant_stream_decodes_to_constant_in_one_iteration() {
	let decoder = Decompressor::from_bytes(&constant_stream(4, 90)).unwrap();
	let restored = decoder.decompress(1, 1234);
	assert!(restored.buffer().iter().all(|&pixel| pixel == 90));
}

#[test]
fn test_negative_bias_saturates_to_black() {
	let decoder = Decompressor::from_bytes(&constant_stream(4, -100)).unwrap();
	let restored = decoder.decompress(1, 0);
	assert!(restored.buffer().iter().all(|&pixel| pixel == 0));
}

#[test]
fn test_decode_is_deterministic_under_fixed_seed() {
	let decoder = Decompressor::from_bytes(&constant_stream(8, 17)).unwrap();
	// Zero iterations exposes the raw random initialization.
	assert_eq!(decoder.decompress(0, 7).buffer(), decoder.decompress(0, 7).buffer());
	assert_ne!(decoder.decompress(0, 7).buffer(), decoder.decompress(0, 8).buffer());
}

#[test]
fn test_parse_rejects_truncated_header() {
	let error = Decompressor::from_bytes(&[4, 0]).unwrap_err();
	assert!(matches!(error, FractalError::InsufficientData { expected: 4, actual: 2 }));
}

#[test]
fn test_parse_rejects_unsupported_block_size() {
	let error = Decompressor::from_bytes(&16i32.to_le_bytes()).unwrap_err();
	assert!(matches!(error, FractalError::InvalidBlockSize(16)));
}

#[test]
fn test_parse_rejects_truncated_mappings() {
	let mut stream = constant_stream(8, 0);
	stream.pop();
	let error = Decompressor::from_bytes(&stream).unwrap_err();
	assert!(matches!(error, FractalError::InsufficientData { .. }));
}

#[test]
fn test_parse_rejects_out_of_range_domain() {
	let mut stream = constant_stream(8, 0);
	// First mapping: domain column 255 cannot host a 16×16 window.
	stream[4] = 255;
	let error = Decompressor::from_bytes(&stream).unwrap_err();
	assert!(matches!(error, FractalError::MappingOutOfRange { index: 0, x: 255, .. }));
}
