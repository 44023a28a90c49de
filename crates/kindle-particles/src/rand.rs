//! Seeded random source for particle simulation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic RNG shared by every emitter and particle of one system.
///
/// All random draws in the simulation go through this type so that a run is
/// reproducible from its seed.
pub struct ParticleRng {
    inner: StdRng,
}

impl ParticleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Returns a float in [min, max]. Reversed bounds are accepted.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if min == max {
            return min;
        }
        let (lo, hi) = if min < max { (min, max) } else { (max, min) };
        (lo + self.next_f32() * (hi - lo)).min(hi)
    }

    /// Returns a float in [-1, 1)
    pub fn signed_unit(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Returns an integer in [0, n), or 0 when `n` is 0
    pub fn index(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.inner.gen_range(0..n)
        }
    }
}
