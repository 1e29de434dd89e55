//! Plucked-string voice: a Karplus-Strong delay line driven by a pluck trigger.
//!
//! # How It Works
//!
//! 1. The delay length `round(sample_rate / frequency)` sets the pitch
//! 2. A pluck at position `p` retunes the string to `frequency · (1 + p)`:
//!    plucking nearer the end raises the pitch
//! 3. The excitation is white noise at a fixed amplitude of 0.5
//! 4. The averaging filter in the delay loop does the rest
//!
//! Plucks arrive through a shared [`PluckTrigger`] and are applied at the
//! start of the next `render_add` call. Both buffers are sized on
//! construction, so applying a pluck never allocates.

use std::sync::Arc;

use crate::dsp::delay::StringDelayLine;
use crate::error::{Result, SynthError};
use crate::synth::trigger::{PluckOutcome, PluckTrigger};

/// Shortest delay line that still gives a stable, audible pitch.
pub const MIN_DELAY_LENGTH: usize = 50;

/// Excitation amplitude applied to every pluck.
pub const PLUCK_AMPLITUDE: f32 = 0.5;

/// Delay length for a frequency, before any range checks.
#[inline]
pub fn delay_length(sample_rate: f32, frequency_hz: f32) -> usize {
    (sample_rate / frequency_hz).round() as usize
}

pub(crate) fn check_sample_rate(sample_rate: f32) -> Result<()> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(SynthError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

pub(crate) fn check_frequency(frequency_hz: f32) -> Result<()> {
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return Err(SynthError::InvalidFrequency(frequency_hz));
    }
    Ok(())
}

pub(crate) fn check_position(position: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&position) {
        return Err(SynthError::PluckPositionOutOfRange(position));
    }
    Ok(())
}

/// Validate that a string at `frequency_hz` gets a long enough delay line.
pub fn checked_delay_length(sample_rate: f32, frequency_hz: f32) -> Result<usize> {
    check_sample_rate(sample_rate)?;
    check_frequency(frequency_hz)?;

    let length = delay_length(sample_rate, frequency_hz);
    if length < MIN_DELAY_LENGTH {
        return Err(SynthError::DelayLineTooShort {
            length,
            minimum: MIN_DELAY_LENGTH,
        });
    }
    Ok(length)
}

/// Validate a retune of a string whose buffers hold `capacity` taps.
///
/// The pitch must fit between `sample_rate / capacity` and
/// `sample_rate / MIN_DELAY_LENGTH`; nothing outside that range is clamped.
pub fn checked_retune_length(sample_rate: f32, frequency_hz: f32, capacity: usize) -> Result<usize> {
    let length = checked_delay_length(sample_rate, frequency_hz)?;
    if length > capacity {
        return Err(SynthError::DelayLineTooLong { length, capacity });
    }
    Ok(length)
}

pub struct StringVoice {
    line: StringDelayLine,
    sample_rate: f32,
    frequency: f32,
    trigger: Arc<PluckTrigger>,
    excitations: u64,
}

impl StringVoice {
    /// Build a string tuned to `frequency_hz`, with buffers sized exactly for
    /// that pitch.
    ///
    /// # Errors
    ///
    /// `DelayLineTooShort` if `round(sample_rate / frequency_hz)` is below
    /// [`MIN_DELAY_LENGTH`]; `InvalidSampleRate` / `InvalidFrequency` for
    /// non-positive or non-finite inputs.
    pub fn new(sample_rate: f32, frequency_hz: f32) -> Result<Self> {
        Self::with_capacity(sample_rate, frequency_hz, 0, 0x5EED)
    }

    /// Build a string whose buffers hold at least `capacity` taps, so later
    /// retuning down to `sample_rate / capacity` Hz never allocates.
    pub fn with_capacity(
        sample_rate: f32,
        frequency_hz: f32,
        capacity: usize,
        seed: u64,
    ) -> Result<Self> {
        let length = checked_delay_length(sample_rate, frequency_hz)?;

        Ok(Self {
            line: StringDelayLine::new(capacity.max(length), length, seed),
            sample_rate,
            frequency: frequency_hz,
            trigger: Arc::new(PluckTrigger::new()),
            excitations: 0,
        })
    }

    /// Share an existing trigger (the engine hands one trigger per voice to
    /// its controller).
    pub fn with_trigger(mut self, trigger: Arc<PluckTrigger>) -> Self {
        self.trigger = trigger;
        self
    }

    /// Request a pluck at `position` (0 = one end, 1 = the other).
    ///
    /// Takes effect at the start of the next `render_add`. Only one pluck can
    /// be pending; a second one before the render is coalesced.
    pub fn pluck(&self, position: f32) -> Result<PluckOutcome> {
        check_position(position)?;
        Ok(self.trigger.request(position))
    }

    /// Handle for plucking from another thread.
    pub fn trigger(&self) -> Arc<PluckTrigger> {
        Arc::clone(&self.trigger)
    }

    /// Render `out.len()` samples, adding them into `out`.
    pub fn render_add(&mut self, out: &mut [f32]) {
        let plucked = self.trigger.consume();
        if let Some(position) = plucked {
            self.excite(position);
        }

        self.line.render_add(out);

        if plucked.is_some() {
            self.trigger.finish();
        }
    }

    fn excite(&mut self, position: f32) {
        let effective = self.frequency * (1.0 + position);
        let length = delay_length(self.sample_rate, effective)
            .clamp(MIN_DELAY_LENGTH, self.line.capacity());

        self.line.excite(length, PLUCK_AMPLITUDE);
        self.excitations = self.excitations.wrapping_add(1);
    }

    /// Retune the string. The new pitch is used from the next pluck on; a
    /// string that is already ringing keeps its current length.
    ///
    /// # Errors
    ///
    /// `DelayLineTooShort` or `DelayLineTooLong` when the pitch does not fit
    /// the buffers; the string keeps its old tuning.
    pub fn set_frequency(&mut self, frequency_hz: f32, sample_rate: f32) -> Result<()> {
        checked_retune_length(sample_rate, frequency_hz, self.line.capacity())?;
        self.frequency = frequency_hz;
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Silence the string and drop any pending pluck.
    pub fn reset(&mut self) {
        self.line.reset();
        self.trigger.reset();
    }

    pub fn delay_line_length(&self) -> usize {
        self.line.length()
    }

    pub fn capacity(&self) -> usize {
        self.line.capacity()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Number of plucks applied so far. Visualisers poll this to animate.
    pub fn excitation_count(&self) -> u64 {
        self.excitations
    }
}
