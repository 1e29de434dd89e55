use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rtrb::Producer;

use crate::config::SynthModel;
use crate::dsp::oscillator::check_nyquist;
use crate::dsp::wavetable::Waveform;
use crate::error::{Result, SynthError};
use crate::synth::message::ControlMessage;
use crate::synth::string::{check_frequency, check_position, checked_retune_length, delay_length};
use crate::synth::trigger::{PluckOutcome, PluckTrigger};

/// Pitch range a retune has to fit, shared by the engine and its controller.
///
/// The range depends on the sample rate, which is only known once the engine
/// is prepared. Until then retunes are only checked for sign and finiteness;
/// the render thread checks them again when it applies them.
pub(crate) struct RetuneLimits {
    model: SynthModel,
    min_string_frequency: f32,
    /// Bits of the prepared sample rate, 0 while unprepared.
    sample_rate: AtomicU32,
}

impl RetuneLimits {
    pub(crate) fn new(model: SynthModel, min_string_frequency: f32) -> Self {
        Self {
            model,
            min_string_frequency,
            sample_rate: AtomicU32::new(0),
        }
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: Option<f32>) {
        let bits = sample_rate.map_or(0, f32::to_bits);
        self.sample_rate.store(bits, Ordering::Release);
    }

    fn sample_rate(&self) -> Option<f32> {
        match self.sample_rate.load(Ordering::Acquire) {
            0 => None,
            bits => Some(f32::from_bits(bits)),
        }
    }

    pub(crate) fn check(&self, hz: f32) -> Result<()> {
        check_frequency(hz)?;
        let Some(sample_rate) = self.sample_rate() else {
            return Ok(());
        };

        match self.model {
            SynthModel::PluckedString => {
                let capacity = delay_length(sample_rate, self.min_string_frequency);
                checked_retune_length(sample_rate, hz, capacity).map(|_| ())
            }
            SynthModel::Oscillator { .. } => check_nyquist(hz, sample_rate),
        }
    }
}

/// Control-thread handle to a [`SynthEngine`](crate::synth::engine::SynthEngine).
///
/// Plucks go straight to the voice's trigger; frequency and waveform changes
/// are queued and applied at the start of the next render call. The handle is
/// `Send`, so it can live on a UI, network or keyboard thread.
pub struct Controller {
    tx: Producer<ControlMessage>,
    /// `triggers[bank][voice]`
    triggers: Vec<Vec<Arc<PluckTrigger>>>,
    limits: Arc<RetuneLimits>,
    voice_count: usize,
}

impl Controller {
    pub(crate) fn new(
        tx: Producer<ControlMessage>,
        triggers: Vec<Vec<Arc<PluckTrigger>>>,
        limits: Arc<RetuneLimits>,
        voice_count: usize,
    ) -> Self {
        Self {
            tx,
            triggers,
            limits,
            voice_count,
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    fn check_voice(&self, voice: usize) -> Result<()> {
        if voice >= self.voice_count {
            log::warn!("voice {voice} out of range ({} voices)", self.voice_count);
            return Err(SynthError::VoiceOutOfRange {
                index: voice,
                count: self.voice_count,
            });
        }
        Ok(())
    }

    /// Pluck `voice` at `position` in [0, 1].
    ///
    /// Every bank's copy of the voice is plucked. Returns `Coalesced` when the
    /// voice already had a pluck pending in every bank.
    pub fn pluck(&self, voice: usize, position: f32) -> Result<PluckOutcome> {
        self.check_voice(voice)?;
        if let Err(e) = check_position(position) {
            log::warn!("rejected pluck on voice {voice}: {e}");
            return Err(e);
        }

        let mut outcome = PluckOutcome::Coalesced;
        for bank in &self.triggers {
            if bank[voice].request(position).is_queued() {
                outcome = PluckOutcome::Queued;
            }
        }

        if outcome == PluckOutcome::Coalesced {
            log::debug!("pluck on voice {voice} coalesced with a pending one");
        }
        Ok(outcome)
    }

    /// Retune `target`. Strings take the new pitch at their next pluck;
    /// oscillators change immediately.
    ///
    /// # Errors
    ///
    /// Once the engine is prepared, `FrequencyAboveNyquist` for oscillators,
    /// and `DelayLineTooShort` or `DelayLineTooLong` for strings whose delay
    /// line cannot hold the pitch.
    pub fn set_frequency(&mut self, target: usize, hz: f32) -> Result<()> {
        self.check_voice(target)?;
        if let Err(e) = self.limits.check(hz) {
            log::warn!("rejected retune of voice {target}: {e}");
            return Err(e);
        }
        self.send(ControlMessage::SetFrequency { target, hz })
    }

    pub fn select_waveform(&mut self, waveform: Waveform) -> Result<()> {
        self.send(ControlMessage::SelectWaveform(waveform))
    }

    fn send(&mut self, message: ControlMessage) -> Result<()> {
        self.tx.push(message).map_err(|_| {
            log::warn!("control queue full, dropped {message:?}");
            SynthError::ControlQueueFull
        })
    }

    /// Whether a pluck on `voice` is waiting for the next block.
    pub fn is_pluck_pending(&self, voice: usize) -> Result<bool> {
        self.check_voice(voice)?;
        Ok(self.triggers.iter().any(|bank| bank[voice].is_pending()))
    }
}
