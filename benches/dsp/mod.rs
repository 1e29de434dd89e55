//! Benchmarks for low-level DSP primitives.

mod delay;
mod mix;
mod oscillator;
mod wavetable;

pub use delay::bench_delay;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
pub use wavetable::bench_wavetable;
