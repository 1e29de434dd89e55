//! The render loop: voice banks, control draining and channel layout.

use std::sync::Arc;

use rtrb::Consumer;

use crate::config::{ChannelLayout, EngineConfig, OscillatorKind, SynthModel};
use crate::dsp::mix;
use crate::dsp::noise::voice_seed;
use crate::dsp::oscillator::{check_nyquist, Oscillator, SineOscillator, WavetableOscillator};
use crate::dsp::wavetable::{WaveTableBank, Waveform};
use crate::error::{Result, SynthError};
use crate::synth::controller::{Controller, RetuneLimits};
use crate::synth::message::{control_queue, ControlMessage, MessageReceiver};
use crate::synth::string::{check_sample_rate, delay_length, StringVoice};
use crate::synth::trigger::PluckTrigger;
use crate::synth::voice::{render_voices, Voice};

/*
Block Flow
==========

Every `render` call runs the same steps:

    ┌──────────────────────────┐
    │ drain control queue      │  SetFrequency / SelectWaveform
    └────────────┬─────────────┘
                 ↓
    ┌──────────────────────────┐
    │ for each sub-block       │  at most max_block_size frames
    │   for each bank          │
    │     clear bus            │
    │     for each voice       │
    │       consume pluck      │
    │       render → scratch   │
    │       bus += gain·scratch│
    │   copy bus[c % banks]    │
    │     into channel c       │
    └──────────────────────────┘

A bank is one full set of voices. `Shared` runs a single bank and copies it
to every channel. `PerChannel { banks }` runs several banks with differently
seeded excitations so the channels decorrelate.

The voice variant is chosen at prepare time, so the match on it happens once
per bank per sub-block, never per sample.
*/

enum VoiceBank {
    Strings(Vec<StringVoice>),
    Sines(Vec<SineOscillator>),
    Tables(Vec<WavetableOscillator>),
}

struct Bank {
    voices: VoiceBank,
    triggers: Vec<Arc<PluckTrigger>>,
    /// Retrigger counts for oscillator voices; strings count their own.
    restarts: Vec<u64>,
}

impl Bank {
    fn render(&mut self, bus: &mut [f32], scratch: &mut [f32], gain: f32) {
        match &mut self.voices {
            VoiceBank::Strings(voices) => render_voices(voices, bus, scratch, gain),
            VoiceBank::Sines(voices) => {
                restart_plucked(voices, &self.triggers, &mut self.restarts);
                render_voices(voices, bus, scratch, gain);
            }
            VoiceBank::Tables(voices) => {
                restart_plucked(voices, &self.triggers, &mut self.restarts);
                render_voices(voices, bus, scratch, gain);
            }
        }
    }

    fn set_frequency(&mut self, target: usize, hz: f32, sample_rate: f32) -> Result<()> {
        let missing = SynthError::VoiceOutOfRange {
            index: target,
            count: self.restarts.len(),
        };
        match &mut self.voices {
            VoiceBank::Strings(voices) => voices
                .get_mut(target)
                .ok_or(missing)?
                .set_frequency(hz, sample_rate),
            VoiceBank::Sines(voices) => {
                Voice::set_frequency(voices.get_mut(target).ok_or(missing)?, hz, sample_rate)
            }
            VoiceBank::Tables(voices) => {
                Voice::set_frequency(voices.get_mut(target).ok_or(missing)?, hz, sample_rate)
            }
        }
    }

    fn select_table(&mut self, tables: &WaveTableBank, waveform: Waveform) {
        if let VoiceBank::Tables(voices) = &mut self.voices {
            for voice in voices.iter_mut() {
                voice.set_table(Arc::clone(tables.get(waveform)));
            }
        }
    }

    fn excitation_count(&self, voice: usize) -> Option<u64> {
        match &self.voices {
            VoiceBank::Strings(voices) => voices.get(voice).map(StringVoice::excitation_count),
            VoiceBank::Sines(_) | VoiceBank::Tables(_) => self.restarts.get(voice).copied(),
        }
    }
}

/// A pluck on an oscillator voice restarts its cycle.
fn restart_plucked<O: Oscillator>(
    voices: &mut [O],
    triggers: &[Arc<PluckTrigger>],
    restarts: &mut [u64],
) {
    for ((voice, trigger), count) in voices.iter_mut().zip(triggers).zip(restarts.iter_mut()) {
        if trigger.consume().is_some() {
            voice.reset();
            *count = count.wrapping_add(1);
            trigger.finish();
        }
    }
}

struct Prepared {
    sample_rate: f32,
    max_block_size: usize,
    banks: Vec<Bank>,
    tables: Option<WaveTableBank>,
    /// One bus per bank, `max_block_size` long.
    buses: Vec<Vec<f32>>,
    scratch: Vec<f32>,
    /// Retunes dropped on the render thread because they did not fit.
    rejected_retunes: u64,
}

impl Prepared {
    fn apply(
        &mut self,
        message: ControlMessage,
        frequencies: &mut [f32],
        waveform: &mut Waveform,
    ) {
        match message {
            ControlMessage::SetFrequency { target, hz } => {
                // Banks hold identical voices, so they all accept or all refuse
                let sample_rate = self.sample_rate;
                let applied = self
                    .banks
                    .iter_mut()
                    .all(|bank| bank.set_frequency(target, hz, sample_rate).is_ok());

                match frequencies.get_mut(target) {
                    Some(frequency) if applied => *frequency = hz,
                    _ => self.rejected_retunes = self.rejected_retunes.wrapping_add(1),
                }
            }
            ControlMessage::SelectWaveform(selected) => {
                *waveform = selected;
                if let Some(tables) = &self.tables {
                    for bank in &mut self.banks {
                        bank.select_table(tables, selected);
                    }
                }
            }
        }
    }

    fn render_buses(&mut self, frames: usize, gain: f32) {
        for (bank, bus) in self.banks.iter_mut().zip(self.buses.iter_mut()) {
            let bus = &mut bus[..frames];
            bus.fill(0.0);
            bank.render(bus, &mut self.scratch, gain);
        }
    }
}

pub struct SynthEngine {
    config: EngineConfig,
    rx: Consumer<ControlMessage>,
    /// `triggers[bank][voice]`, shared with the controller.
    triggers: Vec<Vec<Arc<PluckTrigger>>>,
    frequencies: Vec<f32>,
    waveform: Waveform,
    gain: f32,
    limits: Arc<RetuneLimits>,
    prepared: Option<Prepared>,
}

impl SynthEngine {
    /// Build an engine and the controller that drives it.
    ///
    /// Nothing audio-sized is allocated until [`prepare`](Self::prepare).
    pub fn new(config: EngineConfig) -> Result<(Self, Controller)> {
        config.validate()?;

        let voices = config.voice_count();
        let triggers: Vec<Vec<Arc<PluckTrigger>>> = (0..config.layout.bank_count())
            .map(|_| (0..voices).map(|_| Arc::new(PluckTrigger::new())).collect())
            .collect();

        let limits = Arc::new(RetuneLimits::new(config.model, config.min_string_frequency));
        let (tx, rx) = control_queue(config.control_queue_capacity);
        let controller = Controller::new(tx, triggers.clone(), Arc::clone(&limits), voices);

        let engine = Self {
            frequencies: config.frequencies.clone(),
            waveform: config.waveform,
            gain: mix::voice_gain(config.base_level, voices),
            config,
            rx,
            triggers,
            limits,
            prepared: None,
        };

        Ok((engine, controller))
    }

    /// Allocate every buffer for `sample_rate` and blocks of up to
    /// `max_block_size` frames. Call again to change either.
    ///
    /// # Errors
    ///
    /// `InvalidSampleRate`, `InvalidBlockSize`, `DelayLineTooShort` when a
    /// string's pitch is too high for the sample rate, or
    /// `FrequencyAboveNyquist` for an oscillator voice.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<()> {
        check_sample_rate(sample_rate)?;
        if max_block_size == 0 {
            return Err(SynthError::InvalidBlockSize(max_block_size));
        }
        if let SynthModel::Oscillator { .. } = self.config.model {
            for &hz in &self.frequencies {
                check_nyquist(hz, sample_rate)?;
            }
        }

        let tables = match self.config.model {
            SynthModel::Oscillator {
                kind: OscillatorKind::Wavetable,
            } => Some(WaveTableBank::generate(
                self.config.table_size,
                self.config.correction(),
                self.config.seed,
            )?),
            _ => None,
        };

        let banks = (0..self.triggers.len())
            .map(|bank| self.build_bank(bank, sample_rate, tables.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for trigger in self.triggers.iter().flatten() {
            trigger.reset();
        }

        let bank_count = banks.len();
        self.prepared = Some(Prepared {
            sample_rate,
            max_block_size,
            banks,
            tables,
            buses: vec![vec![0.0; max_block_size]; bank_count],
            scratch: vec![0.0; max_block_size],
            rejected_retunes: 0,
        });
        self.limits.set_sample_rate(Some(sample_rate));

        log::info!(
            "prepared {:?}: {} voices x {} banks at {} Hz, blocks of {}",
            self.config.model,
            self.frequencies.len(),
            bank_count,
            sample_rate,
            max_block_size
        );
        Ok(())
    }

    fn build_bank(
        &self,
        bank: usize,
        sample_rate: f32,
        tables: Option<&WaveTableBank>,
    ) -> Result<Bank> {
        let triggers = self.triggers[bank].clone();
        let count = self.frequencies.len();

        let voices = match (self.config.model, tables) {
            (SynthModel::PluckedString, _) => {
                let capacity = delay_length(sample_rate, self.config.min_string_frequency);
                let voices = self
                    .frequencies
                    .iter()
                    .zip(&triggers)
                    .enumerate()
                    .map(|(voice, (&hz, trigger))| {
                        StringVoice::with_capacity(
                            sample_rate,
                            hz,
                            capacity,
                            voice_seed(self.config.seed, voice, bank),
                        )
                        .map(|string| string.with_trigger(Arc::clone(trigger)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                VoiceBank::Strings(voices)
            }
            (_, Some(tables)) => VoiceBank::Tables(
                self.frequencies
                    .iter()
                    .map(|&hz| {
                        WavetableOscillator::with_frequency(
                            Arc::clone(tables.get(self.waveform)),
                            hz,
                            sample_rate,
                        )
                    })
                    .collect(),
            ),
            (_, None) => VoiceBank::Sines(
                self.frequencies
                    .iter()
                    .map(|&hz| SineOscillator::with_frequency(hz, sample_rate))
                    .collect(),
            ),
        };

        Ok(Bank {
            voices,
            triggers,
            restarts: vec![0; count],
        })
    }

    /// Drop every prepared buffer. Renders fail with `NotPrepared` until the
    /// next `prepare`.
    pub fn release(&mut self) {
        if let Some(prepared) = self.prepared.take() {
            self.limits.set_sample_rate(None);
            if prepared.rejected_retunes > 0 {
                log::warn!(
                    "{} retunes did not fit the prepared voices and were dropped",
                    prepared.rejected_retunes
                );
            }
            log::info!("released engine buffers");
        }
    }

    /// Render `frames` frames into planar `outputs`, one slice per channel.
    ///
    /// Each slice is overwritten. `frames` is clamped to the shortest slice;
    /// calls longer than `max_block_size` are rendered in sub-blocks.
    ///
    /// # Errors
    ///
    /// `NotPrepared` (outputs are zeroed), or `InvalidChannelCount` if
    /// `outputs` is empty.
    pub fn render(&mut self, outputs: &mut [&mut [f32]], frames: usize) -> Result<()> {
        let Some(prepared) = self.prepared.as_mut() else {
            for out in outputs.iter_mut() {
                let n = frames.min(out.len());
                out[..n].fill(0.0);
            }
            return Err(SynthError::NotPrepared);
        };
        if outputs.is_empty() {
            return Err(SynthError::InvalidChannelCount(0));
        }

        while let Some(message) = MessageReceiver::pop(&mut self.rx) {
            prepared.apply(message, &mut self.frequencies, &mut self.waveform);
        }

        let frames = outputs
            .iter()
            .map(|out| out.len())
            .min()
            .unwrap_or(0)
            .min(frames);
        let banks = prepared.banks.len();

        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(prepared.max_block_size);
            prepared.render_buses(n, self.gain);

            for (channel, out) in outputs.iter_mut().enumerate() {
                out[offset..offset + n].copy_from_slice(&prepared.buses[channel % banks][..n]);
            }
            offset += n;
        }
        Ok(())
    }

    /// Render into an interleaved buffer of `channels` channels, as handed
    /// over by most audio devices. Trailing samples that do not fill a whole
    /// frame are zeroed.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) -> Result<()> {
        let Some(prepared) = self.prepared.as_mut() else {
            data.fill(0.0);
            return Err(SynthError::NotPrepared);
        };
        if channels == 0 {
            data.fill(0.0);
            return Err(SynthError::InvalidChannelCount(0));
        }

        while let Some(message) = MessageReceiver::pop(&mut self.rx) {
            prepared.apply(message, &mut self.frequencies, &mut self.waveform);
        }

        let frames = data.len() / channels;
        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(prepared.max_block_size);
            prepared.render_buses(n, self.gain);

            let out = &mut data[offset * channels..(offset + n) * channels];
            mix::interleave(&prepared.buses, out, channels);
            offset += n;
        }
        data[frames * channels..].fill(0.0);
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Number of plucks applied to `voice` in the first bank.
    pub fn excitation_count(&self, voice: usize) -> Result<u64> {
        let prepared = self.prepared.as_ref().ok_or(SynthError::NotPrepared)?;
        prepared
            .banks
            .first()
            .and_then(|bank| bank.excitation_count(voice))
            .ok_or(SynthError::VoiceOutOfRange {
                index: voice,
                count: self.frequencies.len(),
            })
    }

    /// Retunes the render thread dropped since `prepare`, because they were
    /// queued before the sample rate was known and did not fit it.
    pub fn rejected_retunes(&self) -> u64 {
        self.prepared.as_ref().map_or(0, |p| p.rejected_retunes)
    }

    pub fn voice_gain(&self) -> f32 {
        self.gain
    }

    /// The selected waveform. Only wavetable voices sound it.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn voice_count(&self) -> usize {
        self.frequencies.len()
    }

    /// Base frequency of each voice, including applied retunes.
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.prepared.as_ref().map(|p| p.sample_rate)
    }

    pub fn layout(&self) -> ChannelLayout {
        self.config.layout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
