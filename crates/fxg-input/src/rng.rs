const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const MIX_CONST1: u64 = 0xBF58_476D_1CE4_E5B9;
const MIX_CONST2: u64 = 0x94D0_49BB_1331_11EB;

#[must_use]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(MIX_CONST1);
    x = (x ^ (x >> 27)).wrapping_mul(MIX_CONST2);
    x ^ (x >> 31)
}

/// Counter-based splitmix64 stream. Two streams with the same seed yield the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicRng {
    stream_seed: u64,
    counter: u64,
}

impl DeterministicRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            stream_seed: seed,
            counter: 0,
        }
    }

    /// Seed derived from a class tag and a matrix shape.
    #[must_use]
    pub fn for_shape(class_tag: u64, rows: usize, cols: usize) -> Self {
        let shape = ((rows as u64) << 32) ^ (cols as u64);
        Self::new(splitmix64(class_tag.wrapping_mul(GOLDEN_GAMMA) ^ shape))
    }

    #[must_use]
    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        splitmix64(
            self.stream_seed
                .wrapping_add(self.counter.wrapping_mul(GOLDEN_GAMMA)),
        )
    }

    /// Uniform in `[0, 1)` from the high 53 bits.
    #[must_use]
    pub fn next_f64(&mut self) -> f64 {
        let sample = self.next_u64() >> 11;
        sample as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[-1, 1)`.
    #[must_use]
    pub fn next_signed_unit(&mut self) -> f64 {
        2.0 * self.next_f64() - 1.0
    }
}
