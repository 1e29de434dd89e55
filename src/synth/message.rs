use rtrb::{Consumer, Producer, RingBuffer};

use crate::dsp::wavetable::Waveform;

/// Default capacity of the control → render parameter queue.
pub const CONTROL_QUEUE_CAPACITY: usize = 256;

/// Parameter changes carried from the controller to the render thread.
///
/// Plucks do not travel here; they use the per-voice [`PluckTrigger`] so a
/// burst of plucks coalesces instead of filling the queue.
///
/// [`PluckTrigger`]: crate::synth::trigger::PluckTrigger
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlMessage {
    SetFrequency { target: usize, hz: f32 },
    SelectWaveform(Waveform),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Creates a control queue pair: producer for the control side, consumer for
/// the render thread.
pub fn control_queue(capacity: usize) -> (Producer<ControlMessage>, Consumer<ControlMessage>) {
    RingBuffer::new(capacity.max(1))
}
