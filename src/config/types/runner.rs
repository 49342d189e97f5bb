use serde::Deserialize;

use super::{
    DEFAULT_CRASH_DELAY_SECS, DEFAULT_LIFECYCLE_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_RESTART_DELAY_SECS,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub lifecycle_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Pause after an exhausted run before starting a fresh one.
    pub restart_delay_secs: u64,
    /// Pause after a run died unexpectedly.
    pub crash_delay_secs: u64,
    /// Upper bound on fresh runs in continuous mode; unbounded when unset.
    pub max_restarts: Option<u32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lifecycle_timeout_secs: DEFAULT_LIFECYCLE_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            restart_delay_secs: DEFAULT_RESTART_DELAY_SECS,
            crash_delay_secs: DEFAULT_CRASH_DELAY_SECS,
            max_restarts: None,
        }
    }
}
