//! Summing, scaling and channel-layout primitives used by the mixer.

/*
Voice Summing and Headroom
==========================

Mixing is addition. N voices that each peak at ±1.0 can sum to ±N, so the
mixer scales every voice before adding it:

    voice_gain = base_level / voice_count

    |Σ voice_gain · v_k|  ≤  voice_count · voice_gain · max|v_k|
                          =  base_level · max|v_k|

With every voice bounded to [-1, 1], the bus can never exceed ±base_level.
That is the worst case: full-amplitude voices in unison and in phase. Real
material (different pitches, random phases) sums closer to
base_level · √N / N, which is why the default base level of 0.25 leaves a
lot of headroom.

This is gain normalisation, not clipping. Nothing here hard-limits the
signal; a voice that briefly exceeds ±1.0 passes through scaled, not clamped.


Channel Layouts
---------------

  planar        One slice per channel: [L L L L] [R R R R]
                How the engine renders internally.

  interleaved   Frames back to back: [L R L R L R L R]
                What most audio devices hand the callback.

Duplicating a mono bus into every channel is the cheap way to fill a stereo
device; rendering independent banks per channel costs more but decorrelates
the channels.
*/

/// Add `src × gain` into `out`.
#[inline]
pub fn sum_scaled_in_place(out: &mut [f32], src: &[f32], gain: f32) {
    debug_assert_eq!(out.len(), src.len());

    for (o, &s) in out.iter_mut().zip(src.iter()) {
        *o += s * gain;
    }
}

/// Per-voice gain that keeps `voice_count` unison voices within ±`base_level`.
#[inline]
pub fn voice_gain(base_level: f32, voice_count: usize) -> f32 {
    if voice_count == 0 {
        0.0
    } else {
        base_level / voice_count as f32
    }
}

/// Write planar `channels` into an interleaved `out` buffer.
///
/// Channel `c` of the output reads planar channel `c % channels.len()`, so a
/// single mono source fills every device channel.
pub fn interleave<C: AsRef<[f32]>>(channels: &[C], out: &mut [f32], device_channels: usize) {
    if channels.is_empty() || device_channels == 0 {
        out.fill(0.0);
        return;
    }

    for (frame_idx, frame) in out.chunks_exact_mut(device_channels).enumerate() {
        for (c, sample) in frame.iter_mut().enumerate() {
            let source = channels[c % channels.len()].as_ref();
            *sample = source.get(frame_idx).copied().unwrap_or(0.0);
        }
    }
}

/// Peak absolute value of a buffer.
#[inline]
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_scaled() {
        let mut out = [1.0, 1.0, 1.0];
        sum_scaled_in_place(&mut out, &[1.0, -1.0, 0.5], 0.5);
        assert_eq!(out, [1.5, 0.5, 1.25]);
    }

    #[test]
    fn test_voice_gain_bounds_unison() {
        let voices = 10;
        let gain = voice_gain(0.25, voices);
        assert!((gain - 0.025).abs() < 1e-9);

        let mut bus = [0.0f32; 4];
        for _ in 0..voices {
            sum_scaled_in_place(&mut bus, &[1.0, -1.0, 1.0, -1.0], gain);
        }
        assert!(peak(&bus) <= 0.25 + 1e-6);
    }

    #[test]
    fn test_voice_gain_without_voices() {
        assert_eq!(voice_gain(0.25, 0), 0.0);
    }

    #[test]
    fn test_interleave_duplicates_mono() {
        let mono = [1.0, 2.0, 3.0];
        let mut out = [0.0f32; 6];
        interleave(&[&mono], &mut out, 2);
        assert_eq!(out, [1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_interleave_planar_stereo() {
        let left = [1.0, 2.0];
        let right = [-1.0, -2.0];
        let mut out = [0.0f32; 4];
        interleave(&[&left, &right], &mut out, 2);
        assert_eq!(out, [1.0, -1.0, 2.0, -2.0]);
    }
}
