use std::fmt;

/// Errors raised by construction, configuration and control calls.
///
/// Every variant is `Copy` so the render path can hand one back without
/// allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthError {
    /// The string's delay line would be too short for a stable, audible pitch.
    DelayLineTooShort { length: usize, minimum: usize },
    /// A retune needs more delay than the string was prepared with.
    DelayLineTooLong { length: usize, capacity: usize },
    InvalidFrequency(f32),
    FrequencyAboveNyquist { frequency: f32, nyquist: f32 },
    InvalidSampleRate(f32),
    InvalidBlockSize(usize),
    PluckPositionOutOfRange(f32),
    /// Additive partials were given a different number of harmonics and weights.
    PartialCountMismatch { harmonics: usize, weights: usize },
    EmptyPartials,
    ZeroHarmonic,
    TableTooSmall { size: usize, minimum: usize },
    VoiceOutOfRange { index: usize, count: usize },
    InvalidBaseLevel(f32),
    NoVoices,
    InvalidChannelCount(usize),
    /// `render` was called before `prepare` (or after `release`).
    NotPrepared,
    ControlQueueFull,
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::DelayLineTooShort { length, minimum } => write!(
                f,
                "delay line of {length} samples is below the minimum of {minimum}; \
                 raise the sample rate or lower the frequency"
            ),
            SynthError::DelayLineTooLong { length, capacity } => write!(
                f,
                "delay line of {length} samples exceeds the prepared capacity of {capacity}; \
                 lower min_string_frequency"
            ),
            SynthError::InvalidFrequency(hz) => write!(f, "invalid frequency: {hz} Hz"),
            SynthError::FrequencyAboveNyquist { frequency, nyquist } => {
                write!(f, "{frequency} Hz is at or above the Nyquist limit of {nyquist} Hz")
            }
            SynthError::InvalidSampleRate(sr) => write!(f, "invalid sample rate: {sr} Hz"),
            SynthError::InvalidBlockSize(n) => write!(f, "invalid block size: {n}"),
            SynthError::PluckPositionOutOfRange(p) => {
                write!(f, "pluck position {p} is outside [0, 1]")
            }
            SynthError::PartialCountMismatch { harmonics, weights } => write!(
                f,
                "{harmonics} harmonics were given {weights} weights"
            ),
            SynthError::EmptyPartials => write!(f, "additive waveform needs at least one partial"),
            SynthError::ZeroHarmonic => write!(f, "harmonic index 0 is not a partial"),
            SynthError::TableTooSmall { size, minimum } => {
                write!(f, "table size {size} is below the minimum of {minimum}")
            }
            SynthError::VoiceOutOfRange { index, count } => {
                write!(f, "voice {index} does not exist ({count} voices)")
            }
            SynthError::InvalidBaseLevel(level) => {
                write!(f, "base level {level} is outside (0, 1]")
            }
            SynthError::NoVoices => write!(f, "engine needs at least one voice"),
            SynthError::InvalidChannelCount(n) => write!(f, "invalid channel count: {n}"),
            SynthError::NotPrepared => write!(f, "engine rendered before prepare()"),
            SynthError::ControlQueueFull => write!(f, "control queue is full"),
        }
    }
}

impl std::error::Error for SynthError {}

pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_values() {
        let err = SynthError::DelayLineTooShort {
            length: 48,
            minimum: 50,
        };
        let text = err.to_string();
        assert!(text.contains("48"), "{text}");
        assert!(text.contains("50"), "{text}");
    }

    #[test]
    fn nyquist_error_names_both_frequencies() {
        let text = SynthError::FrequencyAboveNyquist {
            frequency: 60_000.0,
            nyquist: 24_000.0,
        }
        .to_string();
        assert!(text.contains("60000") && text.contains("24000"), "{text}");
    }

    #[test]
    fn errors_box_into_dyn_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(SynthError::NotPrepared);
        assert_eq!(boxed.to_string(), "engine rendered before prepare()");
    }
}
