use serde::Deserialize;

use super::{
    DEFAULT_INITIAL_WAIT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WAIT_SECS, DEFAULT_MULTIPLIER,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(alias = "initial_wait")]
    pub initial_wait_secs: f64,
    #[serde(alias = "max_wait")]
    pub max_wait_secs: f64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_wait_secs: DEFAULT_INITIAL_WAIT_SECS,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}
