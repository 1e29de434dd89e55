use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::noise::NoiseSource;
use crate::dsp::polyblep::poly_blep;
use crate::error::{Result, SynthError};

/*
Wavetables
==========

A wavetable stores one cycle of a waveform so an oscillator can replay it at
any pitch by stepping through the table at a fractional rate.

Layout
------

    index:   0    1    2   ...  N-2  N-1 │ N
    phase:   0   1/(N-1)       ...       1 │ guard
                                           │
    guard:   table[N] == table[0]          │

The cycle spans N-1 steps: sample i sits at phase t = i / (N-1). One extra
guard sample duplicates sample 0 so linear interpolation can always read
table[i + 1] without a wrap branch.


Waveform Families
-----------------

  SINE       sin(2πt)                            fundamental only
  TRIANGLE   -1 → +1 → -1, slope 4/(N-1)          odd harmonics, 1/n²
  SAW        2t - 1, PolyBLEP at the wrap         all harmonics, 1/n
  SQUARE     -1 then +1, PolyBLEP at 0 and 0.5    odd harmonics, 1/n
  HARMONIC   weighted sum of fixed partials       one organ-like timbre
  NOISE      uniform [0, 1), uncorrected          everything

Only saw and square have jump discontinuities, so only they take a PolyBLEP
correction. Triangle has corners (discontinuous slope) but its harmonics fall
fast enough that the residual aliasing is left alone.


Why Pre-generate
----------------

Generating a table allocates and calls sin() thousands of times. That is fine
on a control thread at prepare time and never fine inside a render callback,
so the engine builds every family up front and waveform selection only swaps
which shared table the oscillators read.
*/

/// Smallest table that still has a half-cycle on each side of the midpoint.
pub const MIN_TABLE_SIZE: usize = 4;

/// Default number of samples per table (excluding the guard sample).
pub const DEFAULT_TABLE_SIZE: usize = 2048;

/// Harmonic indices of the built-in additive timbre.
pub const DEFAULT_HARMONICS: [u32; 8] = [1, 3, 5, 6, 7, 9, 13, 15];

/// Weights matching [`DEFAULT_HARMONICS`].
pub const DEFAULT_WEIGHTS: [f32; 8] = [0.5, 0.1, 0.05, 0.125, 0.09, 0.005, 0.002, 0.001];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
    Harmonic,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 6] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Harmonic,
        Waveform::Noise,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Waveform::Sine => 0,
            Waveform::Triangle => 1,
            Waveform::Saw => 2,
            Waveform::Square => 3,
            Waveform::Harmonic => 4,
            Waveform::Noise => 5,
        }
    }

    /// The next family in [`Waveform::ALL`], wrapping around.
    pub fn next(self) -> Waveform {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Harmonic => "harmonic",
            Waveform::Noise => "noise",
        }
    }
}

/// Discontinuity correction applied by the saw and square generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    None,
    /// PolyBLEP with the given phase increment in radians per table step.
    PolyBlep { phase_increment: f32 },
}

impl Correction {
    /// PolyBLEP one table step wide.
    pub fn per_sample(size: usize) -> Self {
        Correction::PolyBlep {
            phase_increment: TAU / (size.max(2) - 1) as f32,
        }
    }

    #[inline]
    fn residual(self, t: f32) -> f32 {
        match self {
            Correction::None => 0.0,
            Correction::PolyBlep { phase_increment } => poly_blep(t, phase_increment),
        }
    }
}

/// Harmonic indices and weights for the additive generator.
///
/// Validated on construction so a malformed timbre never reaches a render.
#[derive(Debug, Clone, PartialEq)]
pub struct Partials {
    harmonics: Vec<u32>,
    weights: Vec<f32>,
}

impl Partials {
    pub fn new(harmonics: &[u32], weights: &[f32]) -> Result<Self> {
        if harmonics.len() != weights.len() {
            return Err(SynthError::PartialCountMismatch {
                harmonics: harmonics.len(),
                weights: weights.len(),
            });
        }
        if harmonics.is_empty() {
            return Err(SynthError::EmptyPartials);
        }
        if harmonics.contains(&0) {
            return Err(SynthError::ZeroHarmonic);
        }

        Ok(Self {
            harmonics: harmonics.to_vec(),
            weights: weights.to_vec(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.harmonics.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }
}

impl Default for Partials {
    fn default() -> Self {
        Self {
            harmonics: DEFAULT_HARMONICS.to_vec(),
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

/// One cycle of a waveform plus a guard sample.
#[derive(Debug, Clone)]
pub struct WaveTable {
    samples: Vec<f32>,
    waveform: Waveform,
}

impl WaveTable {
    /// Generate a table of `size` samples (plus guard) for `waveform`.
    ///
    /// Noise is seeded from the clock and differs between calls; use
    /// [`WaveTable::generate_seeded`] for reproducible noise.
    pub fn generate(waveform: Waveform, size: usize, correction: Correction) -> Result<Self> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::generate_seeded(waveform, size, correction, seed)
    }

    pub fn generate_seeded(
        waveform: Waveform,
        size: usize,
        correction: Correction,
        seed: u64,
    ) -> Result<Self> {
        match waveform {
            Waveform::Sine => Self::sine(size),
            Waveform::Triangle => Self::triangle(size),
            Waveform::Saw => Self::saw(size, correction),
            Waveform::Square => Self::square(size, correction),
            Waveform::Harmonic => Self::additive(size, &Partials::default()),
            Waveform::Noise => Self::noise(size, seed),
        }
    }

    pub fn sine(size: usize) -> Result<Self> {
        Self::from_phase_fn(Waveform::Sine, size, |t| (TAU * t).sin())
    }

    pub fn triangle(size: usize) -> Result<Self> {
        Self::from_phase_fn(Waveform::Triangle, size, |t| {
            if t < 0.5 {
                4.0 * t - 1.0
            } else {
                3.0 - 4.0 * t
            }
        })
    }

    pub fn saw(size: usize, correction: Correction) -> Result<Self> {
        Self::from_phase_fn(Waveform::Saw, size, |t| {
            2.0 * t - 1.0 - correction.residual(t)
        })
    }

    pub fn square(size: usize, correction: Correction) -> Result<Self> {
        Self::from_phase_fn(Waveform::Square, size, |t| {
            let naive = if t < 0.5 { -1.0 } else { 1.0 };
            let flip = correction.residual(t);
            let flop = correction.residual((t + 0.5) % 1.0);
            naive - flip + flop
        })
    }

    pub fn additive(size: usize, partials: &Partials) -> Result<Self> {
        Self::from_phase_fn(Waveform::Harmonic, size, |t| {
            partials
                .iter()
                .map(|(harmonic, weight)| weight * (TAU * harmonic as f32 * t).sin())
                .sum()
        })
    }

    pub fn noise(size: usize, seed: u64) -> Result<Self> {
        check_size(size)?;
        let mut rng = NoiseSource::new(seed);
        let mut samples: Vec<f32> = (0..size).map(|_| rng.next_unipolar()).collect();
        samples.push(samples[0]);

        Ok(Self {
            samples,
            waveform: Waveform::Noise,
        })
    }

    fn from_phase_fn(waveform: Waveform, size: usize, f: impl Fn(f32) -> f32) -> Result<Self> {
        check_size(size)?;
        let steps = (size - 1) as f32;

        let mut samples = Vec::with_capacity(size + 1);
        samples.extend((0..size).map(|i| f(i as f32 / steps)));
        samples.push(samples[0]);

        Ok(Self { samples, waveform })
    }

    /// Number of samples in the cycle, excluding the guard.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All samples including the trailing guard.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

fn check_size(size: usize) -> Result<()> {
    if size < MIN_TABLE_SIZE {
        return Err(SynthError::TableTooSmall {
            size,
            minimum: MIN_TABLE_SIZE,
        });
    }
    Ok(())
}

/// One shared table per waveform family, built once at prepare time.
#[derive(Debug, Clone)]
pub struct WaveTableBank {
    tables: Vec<Arc<WaveTable>>,
}

impl WaveTableBank {
    pub fn generate(size: usize, correction: Correction, seed: u64) -> Result<Self> {
        let tables = Waveform::ALL
            .iter()
            .map(|&waveform| {
                WaveTable::generate_seeded(waveform, size, correction, seed).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tables })
    }

    #[inline]
    pub fn get(&self, waveform: Waveform) -> &Arc<WaveTable> {
        &self.tables[waveform.index()]
    }

    pub fn table_size(&self) -> usize {
        self.tables[0].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: usize = 513;

    #[test]
    fn guard_sample_matches_first() {
        for waveform in Waveform::ALL {
            let table = WaveTable::generate(waveform, SIZE, Correction::per_sample(SIZE)).unwrap();
            let s = table.samples();
            assert_eq!(s.len(), SIZE + 1);
            assert_eq!(s[SIZE], s[0], "{waveform:?}");
        }
    }

    #[test]
    fn sine_starts_at_zero_and_is_point_symmetric() {
        let table = WaveTable::sine(SIZE).unwrap();
        let s = table.samples();
        assert_eq!(s[0], 0.0);

        // sample i mirrors -sample (N-1-i) around the midpoint
        for i in 0..SIZE {
            let mirrored = s[SIZE - 1 - i];
            assert!((s[i] + mirrored).abs() < 1e-5, "i = {i}: {} vs {}", s[i], mirrored);
        }
    }

    #[test]
    fn triangle_ramps_between_extremes() {
        let table = WaveTable::triangle(SIZE).unwrap();
        let s = table.samples();
        let slope = 4.0 / (SIZE - 1) as f32;

        assert!((s[0] + 1.0).abs() < 1e-6);
        assert!((s[(SIZE - 1) / 2] - 1.0).abs() < 1e-5);
        assert!((s[SIZE - 1] + 1.0).abs() < 1e-5);
        assert!((s[1] - s[0] - slope).abs() < 1e-5);
        assert!((s[SIZE - 1] - s[SIZE - 2] + slope).abs() < 1e-5);
    }

    #[test]
    fn saw_is_corrected_at_wrap_only() {
        let table = WaveTable::saw(SIZE, Correction::per_sample(SIZE)).unwrap();
        let s = table.samples();

        // Both sides of the wrap meet at the midpoint of the jump
        assert!(s[0].abs() < 1e-6);
        assert!(s[SIZE - 1].abs() < 1e-5);

        // Interior follows the naive ramp exactly
        for i in 1..SIZE - 1 {
            let t = i as f32 / (SIZE - 1) as f32;
            assert!((s[i] - (2.0 * t - 1.0)).abs() < 1e-6, "i = {i}");
        }
    }

    #[test]
    fn uncorrected_saw_keeps_the_jump() {
        let table = WaveTable::saw(SIZE, Correction::None).unwrap();
        let s = table.samples();
        assert!((s[0] + 1.0).abs() < 1e-6);
        assert!((s[SIZE - 1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn square_is_unit_away_from_edges() {
        let table = WaveTable::square(SIZE, Correction::per_sample(SIZE)).unwrap();
        let s = table.samples();
        let mid = (SIZE - 1) / 2;

        for (i, &v) in s.iter().enumerate().take(SIZE) {
            if i == 0 || i == mid || i == SIZE - 1 {
                continue;
            }
            let expected = if i < mid { -1.0 } else { 1.0 };
            assert_eq!(v, expected, "i = {i}");
        }

        // Discontinuities land halfway
        assert!(s[0].abs() < 1e-6);
        assert!(s[mid].abs() < 1e-6);
    }

    #[test]
    fn harmonic_table_matches_partial_sum() {
        let table = WaveTable::additive(SIZE, &Partials::default()).unwrap();
        let s = table.samples();
        let i = 37;
        let t = i as f32 / (SIZE - 1) as f32;
        let expected: f32 = DEFAULT_HARMONICS
            .iter()
            .zip(DEFAULT_WEIGHTS.iter())
            .map(|(&h, &w)| w * (TAU * h as f32 * t).sin())
            .sum();
        assert!((s[i] - expected).abs() < 1e-5);

        let peak = s.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        assert!(peak <= DEFAULT_WEIGHTS.iter().sum::<f32>() + 1e-6);
    }

    #[test]
    fn noise_is_unipolar() {
        let table = WaveTable::noise(SIZE, 3).unwrap();
        assert!(table.samples().iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn mismatched_partials_are_rejected() {
        let err = Partials::new(&[1, 2, 3], &[0.5, 0.25]).unwrap_err();
        assert_eq!(
            err,
            SynthError::PartialCountMismatch {
                harmonics: 3,
                weights: 2
            }
        );
        assert_eq!(Partials::new(&[], &[]).unwrap_err(), SynthError::EmptyPartials);
        assert_eq!(Partials::new(&[0], &[1.0]).unwrap_err(), SynthError::ZeroHarmonic);
    }

    #[test]
    fn tiny_tables_are_rejected() {
        let err = WaveTable::sine(3).unwrap_err();
        assert_eq!(err, SynthError::TableTooSmall { size: 3, minimum: 4 });
    }

    #[test]
    fn regeneration_is_stable() {
        for waveform in Waveform::ALL {
            let a = WaveTable::generate_seeded(waveform, SIZE, Correction::per_sample(SIZE), 9).unwrap();
            let b = WaveTable::generate_seeded(waveform, SIZE, Correction::per_sample(SIZE), 9).unwrap();
            assert_eq!(a.samples(), b.samples(), "{waveform:?}");
        }
    }

    #[test]
    fn bank_holds_every_family() {
        let bank = WaveTableBank::generate(SIZE, Correction::per_sample(SIZE), 1).unwrap();
        for waveform in Waveform::ALL {
            assert_eq!(bank.get(waveform).waveform(), waveform);
            assert_eq!(bank.get(waveform).len(), SIZE);
        }
        assert_eq!(bank.table_size(), SIZE);
    }

    #[test]
    fn waveform_cycles_through_all() {
        let mut w = Waveform::Sine;
        for _ in 0..Waveform::ALL.len() {
            w = w.next();
        }
        assert_eq!(w, Waveform::Sine);
    }
}
