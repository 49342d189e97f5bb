use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the retry state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Attempting,
    AwaitingRetry,
    Succeeded,
    Exhausted,
    Aborted,
    Restarting,
    Cancelled,
}

/// Read-only snapshot published for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub phase: RunPhase,
    pub run: u32,
    pub attempt: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub instance_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl RunStatus {
    pub fn idle(max_attempts: u32) -> Self {
        Self {
            phase: RunPhase::Idle,
            run: 0,
            attempt: 0,
            max_attempts,
            last_error: None,
            instance_id: None,
            updated_at: Utc::now(),
        }
    }
}
