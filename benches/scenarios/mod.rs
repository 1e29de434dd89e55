//! Real-world scenario benchmarks.
//!
//! These run the whole engine the way the device callback does: drain
//! controls, render every voice, write interleaved stereo.

mod mix;

pub use mix::bench_mix;
