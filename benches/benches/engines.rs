//! Benchmark suite for the three engines.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml
//!
//! The fractal encoder dominates the suite; it runs on a reduced sample
//! count so the full search stays affordable.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use retina_benches::{FRACTAL_SIDE, mosaic_image, page_image, ramp_image};
use retina_core::prelude::*;
use std::hint::black_box;

fn bench_vng_recover(c: &mut Criterion) {
	let mut group = c.benchmark_group("vng_recover");
	for side in [256usize, 512] {
		let mosaic = mosaic_image(side, side);
		group.throughput(Throughput::Elements((side * side) as u64));
		group.bench_function(format!("{side}x{side}"), |b| {
			b.iter(|| Demosaicer::new(black_box(&mosaic)).recover());
		});
	}
	group.finish();
}

fn bench_fractal_encode(c: &mut Criterion) {
	let mut group = c.benchmark_group("fractal_encode");
	group.sample_size(10);
	let ramp = ramp_image(FRACTAL_SIDE, FRACTAL_SIDE);
	for (label, r_block_size, fast_mode) in
		[("r8", 8, false), ("r8_fast", 8, true), ("r4_fast", 4, true)]
	{
		group.bench_function(label, |b| {
			b.iter(|| Compressor::new(black_box(&ramp), r_block_size, fast_mode).compress());
		});
	}
	group.finish();
}

fn bench_fractal_decode(c: &mut Criterion) {
	let ramp = ramp_image(FRACTAL_SIDE, FRACTAL_SIDE);
	let stream = Compressor::new(&ramp, 8, true).compress();
	let decoder = Decompressor::from_bytes(&stream).expect("valid stream");
	c.bench_function("fractal_decode_8_iterations", |b| {
		b.iter(|| black_box(&decoder).decompress(8, 42));
	});
}

fn bench_binarize(c: &mut Criterion) {
	let mut group = c.benchmark_group("binarize");
	let page = page_image(640, 480);
	group.throughput(Throughput::Elements((640 * 480) as u64));
	for (label, mode) in [
		("center", BinarizationMode::Center),
		("separated_noise", BinarizationMode::BySeparatedNoiseLevels),
	] {
		group.bench_function(label, |b| {
			b.iter(|| {
				Binarizer::new(
					black_box(&page),
					mode,
					Binarizer::NOISE_LEVEL,
					Binarizer::SIGMA_MULTIPLIER,
				)
				.binarize()
			});
		});
	}
	group.finish();
}

criterion_group!(
	benches,
	bench_vng_recover,
	bench_fractal_encode,
	bench_fractal_decode,
	bench_binarize
);
criterion_main!(benches);
