//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests, a scripted
//! implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send {
    /// Pick an index uniformly from `0..len`. `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Production RNG backed by `StdRng`.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Seeds from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Seeds from a fixed value so a session's draws can be reproduced.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for SystemRng {
    fn next_index(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}
