//! Seeded personality starters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Friendly openers occasionally prefixed to a reply.
pub const STARTERS: &[&str] = &[
    "Great question!",
    "Happy to help with that.",
    "Let's dig in.",
    "Good thinking.",
    "Here's what I found.",
];

/// Chooses whether and which starter to prefix, from an explicit seed.
#[derive(Debug, Clone)]
pub struct PersonalityPicker {
    rng: StdRng,
    probability: f64,
}

impl PersonalityPicker {
    /// With `seed = None` the generator is seeded from OS entropy.
    pub fn new(seed: Option<u64>, probability: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            probability: if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) },
        }
    }

    /// A picker that never adds a starter.
    pub fn disabled() -> Self {
        Self::new(Some(0), 0.0)
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn pick(&mut self) -> Option<&'static str> {
        if !self.rng.gen_bool(self.probability) {
            return None;
        }
        let index = self.rng.gen_range(0..STARTERS.len());
        Some(STARTERS[index])
    }
}
