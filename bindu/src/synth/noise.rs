//! Seedable random source for synthetic scans.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Random source with deterministic seeding support
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// Seed 0 draws from entropy; any other seed is reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Gaussian noise with zero mean
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Uniform index in `[0, upper)`; `upper` must be positive
    #[inline]
    pub fn index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    /// Uniform integer in `[low, high)`
    #[inline]
    pub fn int_in(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..high)
    }

    /// Uniform real in `[low, high)`
    #[inline]
    pub fn uniform_in(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }
}
