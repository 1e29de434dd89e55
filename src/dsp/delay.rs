use crate::dsp::noise::NoiseSource;

/*
Karplus-Strong Delay Line
=========================

A plucked string is a travelling wave bouncing between two fixed ends. Each
round trip takes the same time (that is the pitch) and loses a little energy,
more at high frequencies than low ones (that is the timbre decaying from
bright to mellow).

Karplus-Strong models all of that with one circular buffer and a two-tap
average:

    ┌───────────────────── delay line (length L) ─────────────────────┐
    │ d[0]  d[1]  d[2]  ...                                   d[L-1]  │
    └──▲──────────────────────────────────────────────────────────┬───┘
       │                                                           │
       └──── decay · ½ (d[next] + d[pos]) ◄──────── out += d[pos] ◄┘

Per sample:

    next      = (pos + 1) mod L
    d[next]   = decay · 0.5 · (d[next] + d[pos])
    out[i]   += d[pos]
    pos       = next


Vocabulary
----------

  L             Delay length in samples. Pitch ≈ sample_rate / L.

  excitation    What the string holds right after the pluck. White noise is
                a cheap stand-in for the broadband impulse of a plectrum.

  decay         Loss per round trip (0.998). Closer to 1.0 rings longer.

  two-tap mean  ½ (d[next] + d[pos]) is a one-zero lowpass. Applied once per
                trip, it removes high harmonics faster than low ones, which
                is why the attack is bright and the tail is pure.


Stability
---------

The recursion is stable because |decay · ½ (a + b)| ≤ decay · max(|a|, |b|)
and decay < 1: the peak can never grow. Very short lines are still a problem:
below ~50 taps the pitch quantisation (L is an integer) becomes coarse and
the lowpass eats the fundamental within a few milliseconds. Callers enforce a
minimum length before a line is built.


Allocation
----------

Both buffers are allocated once at `capacity`. A pluck at a new pitch only
changes the active length L ≤ capacity, so re-exciting the string never
allocates and is safe on the render thread.
*/

/// Energy loss applied on every pass through the averaging filter.
pub const DECAY: f32 = 0.998;

pub struct StringDelayLine {
    delay_line: Vec<f32>,
    excitation: Vec<f32>,
    length: usize,
    pos: usize,
    noise: NoiseSource,
}

impl StringDelayLine {
    /// Build a silent line with room for `capacity` taps and `length` active.
    pub fn new(capacity: usize, length: usize, seed: u64) -> Self {
        let capacity = capacity.max(length).max(2);
        let mut noise = NoiseSource::new(seed);
        let mut excitation = vec![0.0; capacity];
        noise.fill_bipolar(&mut excitation);

        Self {
            delay_line: vec![0.0; capacity],
            excitation,
            length: length.clamp(2, capacity),
            pos: 0,
            noise,
        }
    }

    /// Load the excitation into the first `length` taps, scaled by
    /// `amplitude`, and restart from the first tap.
    ///
    /// The excitation is re-rolled afterwards so consecutive plucks differ.
    pub fn excite(&mut self, length: usize, amplitude: f32) {
        self.length = length.clamp(2, self.delay_line.len());

        for (d, &e) in self.delay_line[..self.length]
            .iter_mut()
            .zip(&self.excitation[..self.length])
        {
            *d = amplitude * e;
        }
        self.pos = 0;

        self.noise.fill_bipolar(&mut self.excitation);
    }

    /// Advance the string by `out.len()` samples, adding its output to `out`.
    pub fn render_add(&mut self, out: &mut [f32]) {
        let length = self.length;
        let line = &mut self.delay_line[..length];
        let mut pos = self.pos;

        for sample in out.iter_mut() {
            let next = if pos + 1 == length { 0 } else { pos + 1 };
            line[next] = DECAY * 0.5 * (line[next] + line[pos]);
            *sample += line[pos];
            pos = next;
        }

        self.pos = pos;
    }

    /// Silence the line without touching the excitation.
    pub fn reset(&mut self) {
        self.delay_line.fill(0.0);
        self.pos = 0;
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn capacity(&self) -> usize {
        self.delay_line.len()
    }

    pub fn excitation(&self) -> &[f32] {
        &self.excitation
    }
}
