use std::time::Duration;

use super::backoff::JITTER_RATIO;
use crate::config::ConfigError;

/// Longest wait a policy may produce, jitter included.
const WAIT_CEILING_SECS: f64 = u32::MAX as f64;

/// Resolved retry tuning for one orchestrator run.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_wait_secs: f64,
    max_wait_secs: f64,
    multiplier: f64,
}

impl RetryPolicy {
    /// Builds a policy, rejecting values that break the backoff invariants.
    pub fn new(
        max_attempts: u32,
        initial_wait_secs: f64,
        max_wait_secs: f64,
        multiplier: f64,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !(initial_wait_secs.is_finite() && initial_wait_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial wait must be positive, got {initial_wait_secs}"
            )));
        }
        if !(max_wait_secs.is_finite() && max_wait_secs >= initial_wait_secs) {
            return Err(ConfigError::Invalid(format!(
                "max wait ({max_wait_secs}s) must be at least the initial wait ({initial_wait_secs}s)"
            )));
        }
        if max_wait_secs * (1.0 + JITTER_RATIO) > WAIT_CEILING_SECS {
            return Err(ConfigError::Invalid(format!(
                "max wait ({max_wait_secs}s) is out of range"
            )));
        }
        if !(multiplier.is_finite() && multiplier > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "multiplier must be greater than 1, got {multiplier}"
            )));
        }
        Ok(Self {
            max_attempts,
            initial_wait_secs,
            max_wait_secs,
            multiplier,
        })
    }

    /// Same tuning with a different attempt budget.
    pub fn with_max_attempts(&self, max_attempts: u32) -> Result<Self, ConfigError> {
        Self::new(
            max_attempts,
            self.initial_wait_secs,
            self.max_wait_secs,
            self.multiplier,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_wait(&self) -> Duration {
        Duration::from_secs_f64(self.initial_wait_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs_f64(self.max_wait_secs)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub(crate) fn initial_wait_secs(&self) -> f64 {
        self.initial_wait_secs
    }

    pub(crate) fn max_wait_secs(&self) -> f64 {
        self.max_wait_secs
    }
}
