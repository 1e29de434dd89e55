/// Xorshift64* pseudo-random source.
///
/// Allocation-free and lock-free, so it can refresh a string's excitation on
/// the render thread. Not suitable for anything but noise.
#[derive(Debug, Clone, Copy)]
pub struct NoiseSource {
    state: u64,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift
        let state = seed ^ 0x9E37_79B9_7F4A_7C15;
        Self {
            state: if state == 0 { 0x2545_F491_4F6C_DD1D } else { state },
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        // Top 24 bits fill an f32 mantissa exactly
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform sample in [-1, 1).
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unipolar() * 2.0 - 1.0
    }

    pub fn fill_bipolar(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_bipolar();
        }
    }
}

/// Derive a per-voice seed so voices sharing a base seed excite differently.
#[inline]
pub fn voice_seed(base: u64, voice: usize, bank: usize) -> u64 {
    base.wrapping_add((voice as u64).wrapping_mul(0x9E37_79B9))
        .wrapping_add((bank as u64).wrapping_mul(0x85EB_CA6B).rotate_left(32))
}
