//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use truthdare_core::rng::DeterministicRng;

/// A no-op RNG that always picks the first candidate. Suitable for tests
/// that do not depend on which eligible prompt is drawn.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_index(&mut self, _len: usize) -> usize {
        0
    }
}

/// An RNG that returns indices from a predetermined sequence, each clamped
/// to the candidate count. Panics if the sequence is exhausted.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<usize>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_index(&mut self, len: usize) -> usize {
        let val = self.values[self.index];
        self.index += 1;
        val.min(len - 1)
    }
}
