use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::policy::RetryPolicy;

/// Fraction of the base wait used as symmetric jitter.
pub const JITTER_RATIO: f64 = 0.2;

/// Exponential backoff with symmetric jitter.
///
/// The random source is owned so a seeded generator gives a reproducible
/// sequence of waits.
pub struct Backoff<R = StdRng> {
    policy: RetryPolicy,
    rng: R,
}

impl Backoff<StdRng> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    pub fn seeded(policy: RetryPolicy, seed: u64) -> Self {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Backoff<R> {
    pub fn with_rng(policy: RetryPolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Un-jittered wait in seconds for `attempt` (1-based), capped at the max wait.
    pub fn base_wait_secs(&self, attempt: u32) -> f64 {
        let exponent = attempt.max(1).saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.policy.initial_wait_secs() * self.policy.multiplier().powi(exponent);
        raw.min(self.policy.max_wait_secs())
    }

    /// Wait before the attempt following `attempt`.
    ///
    /// Always within `[initial_wait, max_wait * (1 + JITTER_RATIO)]`.
    pub fn compute_wait(&mut self, attempt: u32) -> Duration {
        let base = self.base_wait_secs(attempt);
        let factor = self.rng.gen_range(-JITTER_RATIO..=JITTER_RATIO);
        let wait = (base * (1.0 + factor)).max(self.policy.initial_wait_secs());
        Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX)
    }
}
