//! Low-level DSP primitives used by the voices and the engine.
//!
//! These components are allocation-free and realtime-safe once built, making
//! them safe to embed directly inside voice structs. Anything that allocates
//! (table generation, buffer sizing) happens in constructors that the engine
//! only calls from `prepare`.

/// Karplus-Strong delay line with its excitation buffer.
pub mod delay;
/// Summing, gain normalisation and interleaving.
pub mod mix;
/// Xorshift noise for excitations and noise tables.
pub mod noise;
/// Analytic sine and wavetable oscillators.
pub mod oscillator;
/// Band-limited step correction for saw and square tables.
pub mod polyblep;
/// Single-cycle tables and their generators.
pub mod wavetable;

pub use oscillator::{Oscillator, SineOscillator, WavetableOscillator};
pub use wavetable::{Correction, Partials, WaveTable, WaveTableBank, Waveform};
