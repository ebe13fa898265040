//! Randomness source for reviewer candidate selection
//!
//! The candidate query returns every eligible id in a stable order and hands
//! the list to a [`CandidatePicker`], so tests can swap the random draw for a
//! seeded or fully deterministic one.

use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Chooses up to `limit` distinct entries from a candidate list
pub trait CandidatePicker: Send + Sync + fmt::Debug {
    /// Return at most `limit` entries of `candidates`, without repeats.
    ///
    /// Returning fewer than `limit` is only allowed when fewer candidates
    /// were supplied.
    fn pick(&self, candidates: Vec<String>, limit: usize) -> Vec<String>;
}

/// Uniform random selection using the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl CandidatePicker for RandomPicker {
    fn pick(&self, mut candidates: Vec<String>, limit: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let (chosen, _) = candidates.partial_shuffle(&mut rng, limit);
        chosen.to_vec()
    }
}

/// Uniform random selection from a seeded RNG, reproducible across runs
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CandidatePicker for SeededPicker {
    fn pick(&self, mut candidates: Vec<String>, limit: usize) -> Vec<String> {
        // A poisoned lock only means another pick panicked; the RNG state is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let (chosen, _) = candidates.partial_shuffle(&mut *rng, limit);
        chosen.to_vec()
    }
}

/// Takes the first `limit` candidates in query order (ascending user id)
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderedPicker;

impl CandidatePicker for OrderedPicker {
    fn pick(&self, mut candidates: Vec<String>, limit: usize) -> Vec<String> {
        candidates.truncate(limit);
        candidates
    }
}
