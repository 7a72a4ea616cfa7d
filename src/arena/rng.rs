//! Deterministic random stream.
//!
//! Every probabilistic outcome in a match (crit rolls, damage ranges, fear
//! wander) is drawn from one seeded stream so that replaying the same seed and
//! the same decision-maker outputs reproduces the match exactly.

use rand::prelude::*;
use rand::rngs::StdRng;

/// Seeded random number generator for deterministic match simulation.
///
/// When a seed is provided, the same seed will always produce the same match
/// outcome. Without a seed, uses system entropy.
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Roll against a probability in [0, 1].
    pub fn chance(&mut self, probability: f32) -> bool {
        self.random_f32() < probability
    }

    /// Random unit direction in the horizontal plane, as (x, z).
    pub fn random_direction(&mut self) -> (f32, f32) {
        let angle = self.random_f32() * std::f32::consts::TAU;
        (angle.cos(), angle.sin())
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
