//! Benchmarks for signal mixing operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strand_dsp::dsp::mix;

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        // Generate test signals
        let signal_a: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let signal_b: Vec<f32> = (0..size).map(|i| (i as f32 * 0.15).cos()).collect();
        let mut output = vec![0.0f32; size];

        // Gain-weighted accumulate, once per voice per block
        group.bench_with_input(BenchmarkId::new("sum_scaled", size), &size, |b, _| {
            b.iter(|| {
                mix::sum_scaled_in_place(
                    black_box(&mut output),
                    black_box(&signal_a),
                    black_box(0.025),
                );
            })
        });

        // Stereo interleave for the device callback
        let mut interleaved = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("interleave_stereo", size), &size, |b, _| {
            b.iter(|| {
                mix::interleave(
                    black_box(&[&signal_a, &signal_b]),
                    black_box(&mut interleaved),
                    2,
                );
            })
        });
    }

    group.finish();
}
