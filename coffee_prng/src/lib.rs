// Seeded pseudo-random number generator for map generation.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. Hand-rolled so that `coffee-lobby generate --seed N`
// prints the same map on every platform and every compiler release; an
// external RNG crate gives no such promise across versions.
//
// The only consumer is `coffee_map::generate`, which needs uniform integers
// and weighted picks. No floating point is used anywhere in here.

/// xoshiro256++ state. Two generators built from the same seed yield the
/// same stream.
#[derive(Clone, Debug)]
pub struct MapRng {
    s: [u64; 4],
}

impl MapRng {
    /// Seed a generator. SplitMix64 spreads the seed over the 256-bit state,
    /// so small consecutive seeds still give unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let out = self.s[0]
            .wrapping_add(self.s[3])
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        out
    }

    /// Uniform integer in `[low, high)`, rejection-sampled so that no value
    /// is favoured by the modulo.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: empty range {low}..{high}");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + r % span;
            }
        }
    }

    /// Pick an index into `weights` with probability proportional to its
    /// weight. Zero-weight entries are never picked.
    ///
    /// Panics if every weight is zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        assert!(total > 0, "weighted_index: all weights are zero");
        let mut roll = self.range_u64(0, total);
        for (i, &w) in weights.iter().enumerate() {
            let w = u64::from(w);
            if roll < w {
                return i;
            }
            roll -= w;
        }
        unreachable!("roll is below the weight total")
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
