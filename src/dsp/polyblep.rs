//! Polynomial band-limited step (PolyBLEP) correction.

use std::f32::consts::TAU;

/*
PolyBLEP
========

A naive sawtooth or square jumps from one value to another in zero time. That
jump contains energy at every frequency, and everything above Nyquist folds
back down as aliasing: inharmonic whistles that move the wrong way when the
pitch changes.

The ideal fix is to replace the jump with a band-limited step (BLEP). PolyBLEP
approximates the difference between the ideal step and the naive step with a
two-segment polynomial that spans one phase increment on each side of the
discontinuity.

Vocabulary
----------

  t       Phase in [0, 1). The discontinuity sits at t = 0 (== 1).

  dt      Phase advance per sample, as a fraction of a cycle:
              dt = phase_increment / 2π

  t'      Phase relative to the discontinuity, scaled by dt. Lies in [0, 1)
          just after the jump and in (-1, 0] just before it.


The Polynomial
--------------

                      t < dt:       t' = t / dt
                                    blep = 2t' - t'² - 1      (in [-1, 0])

                      t > 1 - dt:   t' = (t - 1) / dt
                                    blep = t'² + 2t' + 1      (in (0, 1])

                      otherwise:    blep = 0

  blep
   1 ┤                                       ╭
     │                                     ╭─╯
   0 ┼──╮───────────────────────────────╭──╯
     │ ╭╯
  -1 ┤─╯
     └──────────────────────────────────────→ t
     0  dt                            1-dt  1

Both segments reach exactly 0 at their outer edge (t = dt and t = 1 - dt), so
the correction switches on and off without a step of its own. Across the wrap
the correction jumps from +1 to -1: exactly the size of a unit falling step,
which is what cancels the naive waveform's discontinuity.


Applying It
-----------

  falling edge (saw wrap, square high→low):   value -= blep(t)
  rising edge  (square low→high at t = 0.5):  value += blep((t + 0.5) mod 1)

For a step of height 2 (saw from +1 to -1) the correction brings both sides
of the jump to 0, the midpoint.
*/

/// PolyBLEP residual at phase `t` (in cycles) for a given phase increment in
/// radians per sample.
#[inline]
pub fn poly_blep(t: f32, phase_increment: f32) -> f32 {
    let dt = phase_increment / TAU;

    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INC: f32 = TAU / 64.0; // dt = 1/64

    #[test]
    fn zero_between_edges() {
        let dt = 1.0 / 64.0;
        let mut t = dt;
        while t <= 1.0 - dt {
            assert_eq!(poly_blep(t, INC), 0.0, "t = {t}");
            t += 0.01;
        }
        assert_eq!(poly_blep(dt, INC), 0.0);
        assert_eq!(poly_blep(0.5, INC), 0.0);
    }

    #[test]
    fn continuous_where_correction_switches_off() {
        let dt = 1.0 / 64.0;
        let eps = 1e-4;

        // Approaching t = dt from below
        let below = poly_blep(dt - eps, INC);
        assert!(below.abs() < 1e-2, "blep just below dt = {below}");

        // Approaching t = 1 - dt from above
        let above = poly_blep(1.0 - dt + eps, INC);
        assert!(above.abs() < 1e-2, "blep just above 1-dt = {above}");
    }

    #[test]
    fn cancels_unit_step_at_wrap() {
        // At the discontinuity the residual spans -1 (after) to +1 (before)
        assert!((poly_blep(0.0, INC) + 1.0).abs() < 1e-6);
        assert!((poly_blep(1.0, INC) - 1.0).abs() < 1e-6);

        // Both sides of the wrap are continuous with their neighbours
        let just_after = poly_blep(1e-6, INC);
        let just_before = poly_blep(1.0 - 1e-6, INC);
        assert!((just_after + 1.0).abs() < 1e-3);
        assert!((just_before - 1.0).abs() < 1e-3);
    }

    #[test]
    fn correction_is_monotonic_near_edges() {
        let dt = 1.0 / 64.0;
        let mut prev = poly_blep(0.0, INC);
        for i in 1..=16 {
            let t = dt * i as f32 / 16.0;
            let v = poly_blep(t, INC);
            assert!(v >= prev - 1e-6);
            prev = v;
        }
    }
}
