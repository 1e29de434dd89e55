//! Benchmarks for oscillator waveform generation.
//!
//! The sine pair is the point of this file: analytic `sin()` per sample
//! against one interpolated table read per sample.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strand_dsp::dsp::{
    Correction, Oscillator, SineOscillator, WaveTableBank, WavetableOscillator, Waveform,
};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let tables = WaveTableBank::generate(2048, Correction::per_sample(2048), 7).unwrap();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - uses sin() transcendental function
        let mut osc = SineOscillator::with_frequency(440.0, 48_000.0);
        group.bench_with_input(BenchmarkId::new("sine_analytic", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                osc.render_add(black_box(&mut buffer));
            })
        });

        // Table lookup - two reads and a lerp
        for waveform in [Waveform::Sine, Waveform::Saw, Waveform::Harmonic] {
            let mut osc =
                WavetableOscillator::with_frequency(tables.get(waveform).clone(), 440.0, 48_000.0);
            group.bench_with_input(
                BenchmarkId::new(format!("table_{}", waveform.name()), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.fill(0.0);
                        osc.render_add(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
