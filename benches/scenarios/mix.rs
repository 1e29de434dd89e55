//! Benchmarks for full voice banks.
//!
//! The default thirteen strings, the same count of oscillators, and a stereo
//! pair of independent banks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strand_dsp::config::{ChannelLayout, EngineConfig, OscillatorKind, SynthModel};
use strand_dsp::SynthEngine;

use crate::BLOCK_SIZES;

fn prepared(config: EngineConfig, block: usize) -> SynthEngine {
    let voices = config.voice_count();
    let (mut engine, controller) = SynthEngine::new(config).unwrap();
    engine.prepare(48_000.0, block).unwrap();
    for voice in 0..voices {
        controller.pluck(voice, 0.5).unwrap();
    }
    engine
}

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mix");

    let oscillator_frequencies: Vec<f32> = EngineConfig::default()
        .frequencies
        .iter()
        .map(|f| f * 2.0)
        .collect();

    let scenarios = [
        ("13_strings", EngineConfig::default()),
        (
            "13_strings_per_channel",
            EngineConfig::default().with_layout(ChannelLayout::PerChannel { banks: 2 }),
        ),
        (
            "13_sines_analytic",
            EngineConfig::default()
                .with_model(SynthModel::Oscillator {
                    kind: OscillatorKind::Analytic,
                })
                .with_frequencies(oscillator_frequencies.clone()),
        ),
        (
            "13_sines_table",
            EngineConfig::default()
                .with_model(SynthModel::Oscillator {
                    kind: OscillatorKind::Wavetable,
                })
                .with_frequencies(oscillator_frequencies),
        ),
    ];

    for &size in BLOCK_SIZES {
        let mut data = vec![0.0f32; size * 2];

        for (name, config) in &scenarios {
            let mut engine = prepared(config.clone(), size);
            group.bench_with_input(BenchmarkId::new(*name, size), &size, |b, _| {
                b.iter(|| {
                    engine
                        .render_interleaved(black_box(&mut data), 2)
                        .unwrap();
                })
            });
        }
    }

    group.finish();
}
