//! The random source used by the engine.
//!
//! Each simulator owns one [`Sampler`] for its serial phases (seeding,
//! vaccination, applying infections); the parallel carrier scan derives one
//! additional sampler per worker chunk so that results are reproducible for
//! a fixed seed and worker count.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

/// A seedable uniform / Bernoulli / distribution source.
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    pub fn seed_from_u64(seed: u64) -> Sampler {
        Sampler {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derives the sampler for one worker chunk of one simulated day.
    pub fn for_worker(base_seed: u64, day: i32, chunk: usize) -> Sampler {
        Sampler::seed_from_u64(derive_seed(base_seed, day, chunk))
    }

    /// Simulates a true or false chance of something happening. If the
    /// randomly generated value is less than or equal to the probability
    /// supplied, the function returns true.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() <= probability
    }

    /// A uniformly distributed scalar in `[0, 1)`.
    pub fn scalar(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// A uniformly distributed index in `0..n`.
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    /// Draws from a `rand_distr` distribution.
    pub fn draw<T, D: Distribution<T>>(&mut self, distribution: &D) -> T {
        distribution.sample(&mut self.rng)
    }
}

/// Mixes a base seed, a day, and a worker-chunk number into one seed.
/// SplitMix64-style finalizer; any fixed bijective mix would do, it only
/// has to be stable and spread nearby inputs apart.
fn derive_seed(base_seed: u64, day: i32, chunk: usize) -> u64 {
    let mut z = base_seed
        .wrapping_add((day as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((chunk as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
