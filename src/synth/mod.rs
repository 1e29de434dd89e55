// Purpose: Voices, the pluck handoff and the render loop
// This layer sits above the dsp primitives and owns all realtime state

pub mod controller;
pub mod engine;
pub mod message;
pub mod string;
pub mod trigger;
pub mod voice;

pub use controller::Controller;
pub use engine::SynthEngine;
pub use message::ControlMessage;
pub use string::StringVoice;
pub use trigger::{PluckOutcome, PluckTrigger, TriggerState};
pub use voice::Voice;
