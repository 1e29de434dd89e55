//! Benchmarks for the plucked-string delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strand_dsp::dsp::delay::StringDelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay lengths in samples
    let lengths: &[usize] = &[
        50,   // shortest allowed string, 960 Hz at 48kHz
        480,  // 100 Hz
        2400, // 20 Hz, the default capacity
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &length in lengths {
            let mut line = StringDelayLine::new(2400, length, 1);
            line.excite(length, 0.5);
            group.bench_with_input(
                BenchmarkId::new(format!("render_{length}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.fill(0.0);
                        line.render_add(black_box(&mut buffer));
                    })
                },
            );
        }

        // Excitation copy plus noise refresh, once per pluck
        let mut line = StringDelayLine::new(2400, 480, 1);
        group.bench_with_input(BenchmarkId::new("excite_480", size), &size, |b, _| {
            b.iter(|| {
                line.excite(black_box(480), black_box(0.5));
            })
        });
    }

    group.finish();
}
