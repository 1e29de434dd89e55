use crate::dsp::oscillator::{check_nyquist, Oscillator, SineOscillator, WavetableOscillator};
use crate::error::Result;
use crate::synth::string::{check_frequency, check_sample_rate, StringVoice};

/// A single independently-triggerable sound source the mixer can drive.
///
/// Implementations add into `out`; the mixer owns clearing and gain.
pub trait Voice: Send {
    fn render_add(&mut self, out: &mut [f32]);

    /// Retune the voice. Rejected pitches leave the old tuning in place.
    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) -> Result<()>;
}

fn check_oscillator_frequency(frequency_hz: f32, sample_rate: f32) -> Result<()> {
    check_sample_rate(sample_rate)?;
    check_frequency(frequency_hz)?;
    check_nyquist(frequency_hz, sample_rate)
}

impl Voice for StringVoice {
    fn render_add(&mut self, out: &mut [f32]) {
        StringVoice::render_add(self, out)
    }

    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) -> Result<()> {
        StringVoice::set_frequency(self, frequency_hz, sample_rate)
    }
}

impl Voice for SineOscillator {
    fn render_add(&mut self, out: &mut [f32]) {
        Oscillator::render_add(self, out)
    }

    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) -> Result<()> {
        check_oscillator_frequency(frequency_hz, sample_rate)?;
        Oscillator::set_frequency(self, frequency_hz, sample_rate);
        Ok(())
    }
}

impl Voice for WavetableOscillator {
    fn render_add(&mut self, out: &mut [f32]) {
        Oscillator::render_add(self, out)
    }

    fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) -> Result<()> {
        check_oscillator_frequency(frequency_hz, sample_rate)?;
        Oscillator::set_frequency(self, frequency_hz, sample_rate);
        Ok(())
    }
}

/// Render every voice into `scratch` and accumulate it into `out` at `gain`.
///
/// `scratch` must be at least `out.len()` long.
pub fn render_voices<V: Voice>(voices: &mut [V], out: &mut [f32], scratch: &mut [f32], gain: f32) {
    let scratch = &mut scratch[..out.len()];

    for voice in voices.iter_mut() {
        scratch.fill(0.0);
        voice.render_add(scratch);
        crate::dsp::mix::sum_scaled_in_place(out, scratch, gain);
    }
}
