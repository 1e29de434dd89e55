//! Engine configuration.
//!
//! Everything here is decided once, before `prepare`: which synthesis model
//! runs, how many voices at which pitches, the output level, the channel
//! layout and the wavetable resolution.
//!
//! # Example
//!
//! ```
//! use strand_dsp::config::{EngineConfig, SynthModel, OscillatorKind};
//! use strand_dsp::dsp::Waveform;
//!
//! let config = EngineConfig::default()
//!     .with_model(SynthModel::Oscillator { kind: OscillatorKind::Wavetable })
//!     .with_frequencies(vec![220.0, 330.0, 440.0])
//!     .with_waveform(Waveform::Saw);
//! assert!(config.validate().is_ok());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::wavetable::{Correction, Waveform, DEFAULT_TABLE_SIZE, MIN_TABLE_SIZE};
use crate::error::{Result, SynthError};
use crate::synth::message::CONTROL_QUEUE_CAPACITY;

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Lowest accepted `min_string_frequency`. String buffers are sized for it,
/// so at 48 kHz this floor means one second of delay line per voice.
pub const MIN_STRING_FREQUENCY: f32 = 1.0;

/// MIDI notes of the default string set (F#2 up to A#4).
pub const DEFAULT_STRING_NOTES: [u8; 13] = [42, 44, 46, 49, 51, 54, 56, 58, 61, 63, 66, 68, 70];

/// How an oscillator voice produces its signal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorKind {
    /// `sin()` per sample. Sine only, ignores waveform selection.
    Analytic,
    /// Interpolated lookup into the selected wavetable.
    Wavetable,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthModel {
    PluckedString,
    Oscillator { kind: OscillatorKind },
}

/// How rendered voices map onto output channels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Render once, copy into every channel.
    Shared,
    /// Render `banks` independent voice sets into the first `banks` channels;
    /// further channels repeat them.
    PerChannel { banks: usize },
}

impl ChannelLayout {
    pub fn bank_count(self) -> usize {
        match self {
            ChannelLayout::Shared => 1,
            ChannelLayout::PerChannel { banks } => banks,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub model: SynthModel,
    /// One voice per entry, in Hz.
    pub frequencies: Vec<f32>,
    /// Ceiling of the summed bus; each voice gets `base_level / voices`.
    pub base_level: f32,
    pub layout: ChannelLayout,
    /// Samples per wavetable cycle, excluding the guard sample.
    pub table_size: usize,
    /// Waveform selected when the engine is prepared.
    pub waveform: Waveform,
    /// Apply PolyBLEP to the saw and square tables.
    pub band_limited: bool,
    /// Lowest pitch a string can be retuned to without reallocating. At least
    /// [`MIN_STRING_FREQUENCY`].
    pub min_string_frequency: f32,
    pub control_queue_capacity: usize,
    /// Seed for excitation noise and the noise table.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: SynthModel::PluckedString,
            frequencies: DEFAULT_STRING_NOTES
                .iter()
                .map(|&note| midi_note_to_freq(note))
                .collect(),
            base_level: 0.25,
            layout: ChannelLayout::Shared,
            table_size: DEFAULT_TABLE_SIZE,
            waveform: Waveform::Sine,
            band_limited: true,
            min_string_frequency: 20.0,
            control_queue_capacity: CONTROL_QUEUE_CAPACITY,
            seed: 0x5EED_CAFE,
        }
    }
}

impl EngineConfig {
    pub fn with_model(mut self, model: SynthModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_frequencies(mut self, frequencies: Vec<f32>) -> Self {
        self.frequencies = frequencies;
        self
    }

    pub fn with_base_level(mut self, base_level: f32) -> Self {
        self.base_level = base_level;
        self
    }

    pub fn with_layout(mut self, layout: ChannelLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_band_limiting(mut self, band_limited: bool) -> Self {
        self.band_limited = band_limited;
        self
    }

    pub fn with_min_string_frequency(mut self, min_string_frequency: f32) -> Self {
        self.min_string_frequency = min_string_frequency;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn voice_count(&self) -> usize {
        self.frequencies.len()
    }

    pub fn correction(&self) -> Correction {
        if self.band_limited {
            Correction::per_sample(self.table_size)
        } else {
            Correction::None
        }
    }

    /// Check everything that does not depend on the sample rate.
    ///
    /// String lengths are checked in `prepare`, once the rate is known.
    pub fn validate(&self) -> Result<()> {
        if self.frequencies.is_empty() {
            return Err(SynthError::NoVoices);
        }
        if let Some(&bad) = self
            .frequencies
            .iter()
            .find(|f| !(f.is_finite() && **f > 0.0))
        {
            return Err(SynthError::InvalidFrequency(bad));
        }
        if !(self.base_level > 0.0 && self.base_level <= 1.0) {
            return Err(SynthError::InvalidBaseLevel(self.base_level));
        }
        if self.table_size < MIN_TABLE_SIZE {
            return Err(SynthError::TableTooSmall {
                size: self.table_size,
                minimum: MIN_TABLE_SIZE,
            });
        }
        if self.layout.bank_count() == 0 {
            return Err(SynthError::InvalidChannelCount(0));
        }
        if !(self.min_string_frequency.is_finite()
            && self.min_string_frequency >= MIN_STRING_FREQUENCY)
        {
            return Err(SynthError::InvalidFrequency(self.min_string_frequency));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
pub use self::toml_config::ConfigError;

#[cfg(feature = "serde")]
mod toml_config {
    use std::fmt;

    use super::EngineConfig;
    use crate::error::SynthError;

    #[derive(Debug)]
    pub enum ConfigError {
        Parse(toml::de::Error),
        Invalid(SynthError),
    }

    impl fmt::Display for ConfigError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
                ConfigError::Invalid(e) => write!(f, "invalid config: {e}"),
            }
        }
    }

    impl std::error::Error for ConfigError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                ConfigError::Parse(e) => Some(e),
                ConfigError::Invalid(e) => Some(e),
            }
        }
    }

    impl EngineConfig {
        /// Parse a TOML document. Missing keys take their default values.
        pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
            let config: EngineConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
            config.validate().map_err(ConfigError::Invalid)?;
            Ok(config)
        }

        pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
            toml::to_string(self)
        }
    }
}
