use thiserror::Error;

use crate::config::ConfigError;

/// Error types that can occur while hunting for an instance.
#[derive(Debug, Error)]
pub enum HunterError {
    /// The provider rejected the request with a service error
    #[error("service error ({status} {code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    /// The provider throttled the request (HTTP 429)
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    /// Transport-level failures talking to a remote API
    #[error("network error: {0}")]
    Network(String),
    /// A response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
    /// Notification channel failures
    #[error("notification error: {0}")]
    Notification(String),
    /// Invalid or incomplete configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Entry guard refused to start the hunter
    #[error("guard rejected start: {0}")]
    Guard(String),
    /// Generic error
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for HunterError {
    fn from(err: reqwest::Error) -> Self {
        HunterError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for HunterError {
    fn from(err: serde_json::Error) -> Self {
        HunterError::Decode(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
