use std::f32::consts::TAU;
use std::sync::Arc;

use crate::dsp::wavetable::WaveTable;
use crate::error::{Result, SynthError};

/*
Two Ways to Make a Periodic Signal
==================================

ANALYTIC (SineOscillator)
    Keep a phase angle, call sin() every sample.

        angle_delta = 2π · f / sample_rate
        out         = sin(angle);  angle += angle_delta;  wrap at 2π

    Exact, but sin() is one of the more expensive things a voice can do per
    sample. Only produces a sine.

TABLE LOOKUP (WavetableOscillator)
    Step a fractional index through a precomputed single cycle and
    interpolate between neighbours.

        increment = f · (N - 1) / sample_rate     (table steps per sample)

        i0   = floor(index)          frac = index - i0
        out  = table[i0] + frac · (table[i0 + 1] - table[i0])
        index += increment;  if index > N - 1 { index -= N - 1 }

    One multiply-add per sample and any waveform the table holds. The guard
    sample at table[N] keeps `i0 + 1` in bounds at the wrap point.


Period
------

Both produce a signal with period sample_rate / f samples. For the table
oscillator that is (N - 1) / increment: one full pass through the cycle.
*/

/// Reject pitches a sampled oscillator cannot represent.
pub fn check_nyquist(frequency_hz: f32, sample_rate: f32) -> Result<()> {
    let nyquist = sample_rate * 0.5;
    if frequency_hz >= nyquist {
        return Err(SynthError::FrequencyAboveNyquist {
            frequency: frequency_hz,
            nyquist,
        });
    }
    Ok(())
}

/// Common capability of the per-voice oscillators.
pub trait Oscillator: Send {
    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32);

    fn next_sample(&mut self) -> f32;

    /// Return to phase zero.
    fn reset(&mut self);

    /// Add the next `out.len()` samples into `out`.
    fn render_add(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample += self.next_sample();
        }
    }
}

/// Analytic sine: the reference against which table lookup is measured.
#[derive(Debug, Clone, Default)]
pub struct SineOscillator {
    current_angle: f32,
    angle_delta: f32,
}

impl SineOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frequency(frequency_hz: f32, sample_rate: f32) -> Self {
        let mut osc = Self::new();
        osc.set_frequency(frequency_hz, sample_rate);
        osc
    }

    pub fn phase(&self) -> f32 {
        self.current_angle
    }
}

impl Oscillator for SineOscillator {
    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) {
        self.angle_delta = TAU * frequency_hz / sample_rate;
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let out = self.current_angle.sin();
        self.current_angle += self.angle_delta;
        if !(0.0..TAU).contains(&self.current_angle) {
            self.current_angle = self.current_angle.rem_euclid(TAU);
        }
        out
    }

    fn reset(&mut self) {
        self.current_angle = 0.0;
    }
}

/// Interpolating reader over a shared [`WaveTable`].
#[derive(Debug, Clone)]
pub struct WavetableOscillator {
    table: Arc<WaveTable>,
    index: f32,
    increment: f32,
}

impl WavetableOscillator {
    pub fn new(table: Arc<WaveTable>) -> Self {
        Self {
            table,
            index: 0.0,
            increment: 0.0,
        }
    }

    pub fn with_frequency(table: Arc<WaveTable>, frequency_hz: f32, sample_rate: f32) -> Self {
        let mut osc = Self::new(table);
        osc.set_frequency(frequency_hz, sample_rate);
        osc
    }

    /// Swap the table being read.
    ///
    /// Cloning the `Arc` only bumps a counter, and the caller keeps its own
    /// reference, so this never allocates or frees on the render thread.
    /// Index and increment are rescaled when the table size changes so pitch
    /// and phase carry over.
    pub fn set_table(&mut self, table: Arc<WaveTable>) {
        let old_steps = (self.table.len() - 1) as f32;
        let new_steps = (table.len() - 1) as f32;
        if old_steps != new_steps {
            let scale = new_steps / old_steps;
            self.index = (self.index * scale).min(new_steps);
            self.increment *= scale;
        }
        self.table = table;
    }

    pub fn table(&self) -> &Arc<WaveTable> {
        &self.table
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }

    pub fn index(&self) -> f32 {
        self.index
    }
}

impl Oscillator for WavetableOscillator {
    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) {
        let steps = (self.table.len() - 1) as f32;
        self.increment = frequency_hz * steps / sample_rate;
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let samples = self.table.samples();
        let steps = (samples.len() - 2) as f32;

        let i0 = self.index as usize;
        let frac = self.index - i0 as f32;
        let a = samples[i0];
        let b = samples[i0 + 1];
        let out = a + frac * (b - a);

        // One subtraction is not enough once the increment exceeds a cycle
        self.index += self.increment;
        if !(0.0..=steps).contains(&self.index) {
            self.index = self.index.rem_euclid(steps);
        }
        out
    }

    fn reset(&mut self) {
        self.index = 0.0;
    }
}
