//! Deterministic score seeding.
//!
//! RULE: Nothing in the core may call any platform RNG.
//! The only randomness in the engine is the low initial fraud score
//! stamped on a brand-new review, and it flows through one ScoreSeeder
//! derived from the master seed in OpsConfig. Same seed, same scores.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct ScoreSeeder {
    inner: Pcg64Mcg,
}

impl ScoreSeeder {
    pub fn new(master_seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(master_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Initial fraud score for a new review: [0, span).
    pub fn initial_score(&mut self, span: f64) -> f64 {
        self.next_f64() * span
    }
}
