#[path = "retry/policy.rs"]
mod policy;

#[path = "retry/backoff.rs"]
mod backoff;

pub use backoff::{Backoff, JITTER_RATIO};
pub use policy::RetryPolicy;
