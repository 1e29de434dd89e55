//! Benchmarks for table generation. This runs in `prepare`, not per block,
//! but bounds how long a device restart takes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strand_dsp::dsp::{Correction, Partials, WaveTable, WaveTableBank};

pub fn bench_wavetable(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable");

    for size in [512usize, 2048] {
        group.bench_with_input(BenchmarkId::new("saw_polyblep", size), &size, |b, &size| {
            b.iter(|| WaveTable::saw(black_box(size), Correction::per_sample(size)))
        });

        let partials = Partials::default();
        group.bench_with_input(BenchmarkId::new("additive", size), &size, |b, &size| {
            b.iter(|| WaveTable::additive(black_box(size), &partials))
        });

        group.bench_with_input(BenchmarkId::new("full_bank", size), &size, |b, &size| {
            b.iter(|| WaveTableBank::generate(black_box(size), Correction::per_sample(size), 1))
        });
    }

    group.finish();
}
