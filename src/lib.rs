pub mod config; // Engine configuration and TOML loading
pub mod dsp;
pub mod error;
pub mod synth; // Voices, pluck handoff and the render loop

pub use config::{ChannelLayout, EngineConfig, OscillatorKind, SynthModel};
pub use error::{Result, SynthError};
pub use synth::{Controller, PluckOutcome, SynthEngine};

/// Largest block the binary asks the engine to prepare for.
pub const MAX_BLOCK_SIZE: usize = 2048;
