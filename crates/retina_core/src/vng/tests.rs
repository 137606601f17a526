//! Unit tests for the VNG demosaicer.

use super::*;

fn mosaic_from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> GrayImage {
	let mut cfa = GrayImage::new(width, height);
	for y in 0..height {
		for x in 0..width {
			cfa.set_value(y, x, f(y, x));
		}
	}
	cfa
}

/// Deterministic pseudo-random pixel values, good enough for invariants.
fn noise(y: usize, x: usize) -> u8 {
	let mut v = (y * 31 + x * 17 + 7) as u32;
	v ^= v << 13;
	v ^= v >> 7;
	(v % 256) as u8
}

#[test]
fn test_uniform_mosaic_recovers_uniform_color() {
	for value in [0u8, 1, 64, 128, 255] {
		let cfa = mosaic_from_fn(8, 6, |_, _| value);
		let recovered = Demosaicer::new(&cfa).recover();
		for y in 0..6 {
			for x in 0..8 {
				for component in [RgbComponent::Red, RgbComponent::Green, RgbComponent::Blue] {
					assert_eq!(recovered.value(y, x, component), value, "({y}, {x})");
				}
			}
		}
	}
}

#[test]
fn test_output_dimensions_match_input() {
	let cfa = mosaic_from_fn(11, 7, noise);
	let recovered = Demosaicer::new(&cfa).recover();
	assert_eq!(recovered.width(), 11);
	assert_eq!(recovered.height(), 7);
}

#[test]
fn test_known_channel_copies_mosaic_value() {
	let cfa = mosaic_from_fn(12, 10, noise);
	let recovered = Demosaicer::new(&cfa).recover();
	for y in 0..10 {
		for x in 0..12 {
			let native = if (y + x) % 2 == 1 {
				RgbComponent::Green
			} else if y % 2 == 0 {
				RgbComponent::Red
			} else {
				RgbComponent::Blue
			};
			assert_eq!(recovered.value(y, x, native), cfa.value(y, x), "({y}, {x})");
		}
	}
}

#[test]
fn test_recover_is_deterministic() {
	let cfa = mosaic_from_fn(16, 16, noise);
	let first = Demosaicer::new(&cfa).recover();
	let second = Demosaicer::new(&cfa).recover();
	assert_eq!(first, second);
}

#[test]
fn test_expansion_mirrors_without_repeating_edges() {
	let cfa = mosaic_from_fn(5, 4, |y, x| (10 * y + x) as u8);
	let demosaicer = Demosaicer::new(&cfa);
	let at = |ey: usize, ex: usize| demosaicer.expanded[ey * demosaicer.ewidth + ex];

	// Interior copies the source with a (2, 2) offset.
	assert_eq!(at(2, 2), cfa.value(0, 0));
	assert_eq!(at(5, 6), cfa.value(3, 4));
	// Left border: column -1 mirrors column 1, column -2 mirrors column 2.
	assert_eq!(at(2, 1), cfa.value(0, 1));
	assert_eq!(at(2, 0), cfa.value(0, 2));
	// Right border of a width-5 image: columns 5 and 6 mirror columns 3 and 2.
	assert_eq!(at(2, 7), cfa.value(0, 3));
	assert_eq!(at(2, 8), cfa.value(0, 2));
	// Top and bottom rows mirror the same way.
	assert_eq!(at(1, 2), cfa.value(1, 0));
	assert_eq!(at(0, 2), cfa.value(2, 0));
	assert_eq!(at(6, 2), cfa.value(2, 0));
	assert_eq!(at(7, 2), cfa.value(1, 0));
}

#[test]
fn test_expansion_preserves_mosaic_parity() {
	// Green pixels (odd y + x) get 200, others 50; the mirrored border must
	// put green values only on green expanded sites.
	let cfa = mosaic_from_fn(6, 6, |y, x| if (y + x) % 2 == 1 { 200 } else { 50 });
	let demosaicer = Demosaicer::new(&cfa);
	for ey in 0..demosaicer.eheight {
		for ex in 0..demosaicer.ewidth {
			let expected = if (ey + ex) % 2 == 1 { 200 } else { 50 };
			assert_eq!(demosaicer.expanded[ey * demosaicer.ewidth + ex], expected, "({ey}, {ex})");
		}
	}
}

#[test]
fn test_gradient_threshold_is_asymmetric() {
	let cfa = mosaic_from_fn(8, 8, |_, _| 0);
	let mut demosaicer = Demosaicer::new(&cfa);
	demosaicer.direction = [10, 20, 30, 40, 50, 60, 70, 80];
	// min + max / 2, not (min + max) / 2.
	assert_eq!(demosaicer.gradient_threshold(), 10 + 80 / 2);
	demosaicer.direction = [5, 5, 5, 5, 5, 5, 5, 11];
	assert_eq!(demosaicer.gradient_threshold(), 5 + 11 / 2);
}

#[test]
fn test_all_pixels_defined_on_small_input() {
	// 3×3 is the smallest accepted mosaic; every output pixel must come from
	// the regular interpolation path over the mirrored expansion.
	let cfa = mosaic_from_fn(3, 3, noise);
	let recovered = Demosaicer::new(&cfa).recover();
	assert_eq!(recovered.width(), 3);
	assert_eq!(recovered.height(), 3);
}
