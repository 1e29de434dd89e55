//! Lock-free pluck handoff from control threads to the render thread.

use std::sync::atomic::{AtomicU64, Ordering};

/*
The Pluck Trigger
=================

A pluck is requested on a control thread (UI, network, keyboard) and must take
effect on the render thread at the start of the next block. The render thread
may not lock, so the two sides meet on a single atomic word.

Word Layout
-----------

    63            32 31                     0
    ┌──────────────┬────────────────────────┐
    │    state     │  pluck position (f32)  │
    └──────────────┴────────────────────────┘

Carrying the position in the same word as the state means one
compare-and-exchange publishes both. There is no window where the render
thread sees "requested" with a stale position.

States
------

    ┌──────┐  request(p)   ┌───────────────┐  consume()   ┌──────────┐
    │ Idle │ ────────────→ │ Requested(p)  │ ───────────→ │ Consumed │
    └──────┘  control CAS  └───────────────┘  render CAS  └──────────┘
        ↑                                                      │
        └──────────────────── finish() ────────────────────────┘
                          render, end of block

  request   CAS Idle → Requested(p), AcqRel on success. Fails (the pluck is
            coalesced) in any other state: at most one pluck per voice is in
            flight, and one issued while a block is re-exciting the string
            is folded into that excitation.

  consume   Load with Acquire, then CAS Requested(p) → Consumed with AcqRel.
            Exactly one consume succeeds per request.

  finish    CAS Consumed → Idle with Release once the block that applied the
            excitation is rendered.

Single writer per transition: control threads only ever move Idle →
Requested, the render thread only moves Requested → Consumed → Idle. Multiple
control threads may race on `request`; the CAS picks exactly one winner.
*/

const STATE_SHIFT: u32 = 32;
const IDLE: u64 = 0;
const REQUESTED: u64 = 1;
const CONSUMED: u64 = 2;

const IDLE_WORD: u64 = IDLE << STATE_SHIFT;
const CONSUMED_WORD: u64 = CONSUMED << STATE_SHIFT;

#[inline]
fn pack(state: u64, position: f32) -> u64 {
    (state << STATE_SHIFT) | position.to_bits() as u64
}

#[inline]
fn state_of(word: u64) -> u64 {
    word >> STATE_SHIFT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Requested,
    /// Taken by the render thread; the excitation lands in the current block.
    Consumed,
}

/// What happened to a pluck request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluckOutcome {
    /// The pluck will re-excite the string at the next block boundary.
    Queued,
    /// Another pluck was already pending; this one was folded into it.
    Coalesced,
}

impl PluckOutcome {
    pub fn is_queued(self) -> bool {
        matches!(self, PluckOutcome::Queued)
    }
}

#[derive(Debug)]
pub struct PluckTrigger {
    word: AtomicU64,
}

impl PluckTrigger {
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(IDLE_WORD),
        }
    }

    /// Control side: ask for a pluck at `position`.
    ///
    /// The caller validates `position`; the trigger carries it verbatim.
    pub fn request(&self, position: f32) -> PluckOutcome {
        match self.word.compare_exchange(
            IDLE_WORD,
            pack(REQUESTED, position),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => PluckOutcome::Queued,
            Err(_) => PluckOutcome::Coalesced,
        }
    }

    /// Render side: take a pending request, returning its position.
    #[inline]
    pub fn consume(&self) -> Option<f32> {
        let word = self.word.load(Ordering::Acquire);
        if state_of(word) != REQUESTED {
            return None;
        }

        self.word
            .compare_exchange(word, CONSUMED_WORD, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| f32::from_bits(word as u32))
    }

    /// Render side: close the block that applied a consumed request.
    #[inline]
    pub fn finish(&self) {
        let _ = self.word.compare_exchange(
            CONSUMED_WORD,
            IDLE_WORD,
            Ordering::Release,
            Ordering::Relaxed,
        );
    }

    pub fn state(&self) -> TriggerState {
        match state_of(self.word.load(Ordering::Acquire)) {
            REQUESTED => TriggerState::Requested,
            CONSUMED => TriggerState::Consumed,
            _ => TriggerState::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TriggerState::Requested
    }

    /// Drop any pending request. Only call while no block is rendering.
    pub fn reset(&self) {
        self.word.store(IDLE_WORD, Ordering::Release);
    }
}

impl Default for PluckTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn request_then_consume_once() {
        let trigger = PluckTrigger::new();
        assert_eq!(trigger.request(0.25), PluckOutcome::Queued);
        assert_eq!(trigger.state(), TriggerState::Requested);

        assert_eq!(trigger.consume(), Some(0.25));
        assert_eq!(trigger.state(), TriggerState::Consumed);
        assert_eq!(trigger.consume(), None);

        trigger.finish();
        assert_eq!(trigger.state(), TriggerState::Idle);
    }

    #[test]
    fn second_request_is_coalesced() {
        let trigger = PluckTrigger::new();
        assert_eq!(trigger.request(0.1), PluckOutcome::Queued);
        assert_eq!(trigger.request(0.9), PluckOutcome::Coalesced);

        // First position wins
        assert_eq!(trigger.consume(), Some(0.1));
    }

    #[test]
    fn requests_during_consumed_block_are_coalesced() {
        let trigger = PluckTrigger::new();
        trigger.request(0.5);
        trigger.consume();
        assert_eq!(trigger.request(0.5), PluckOutcome::Coalesced);
        trigger.finish();
        assert_eq!(trigger.request(0.5), PluckOutcome::Queued);
    }

    #[test]
    fn finish_without_consume_keeps_request() {
        let trigger = PluckTrigger::new();
        trigger.request(0.75);
        trigger.finish();
        assert!(trigger.is_pending());
    }

    #[test]
    fn position_edges_survive_packing() {
        for p in [0.0f32, 1.0, 0.5, f32::MIN_POSITIVE] {
            let trigger = PluckTrigger::new();
            trigger.request(p);
            assert_eq!(trigger.consume(), Some(p));
        }
    }

    #[test]
    fn racing_control_threads_queue_exactly_one() {
        let trigger = Arc::new(PluckTrigger::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let trigger = Arc::clone(&trigger);
                thread::spawn(move || trigger.request(i as f32 / 8.0))
            })
            .collect();

        let queued = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| o.is_queued())
            .count();
        assert_eq!(queued, 1);
        assert!(trigger.consume().is_some());
        assert!(trigger.consume().is_none());
    }
}
