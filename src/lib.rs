//! Capacity hunter for cloud instances.
//!
//! Launch attempts are retried with jittered exponential backoff until an
//! instance reaches RUNNING, and every step is reported to a chat channel.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use notivm::config::load_config;
//! use notivm::notify::TelegramChannel;
//! use notivm::orchestrator::Orchestrator;
//! use notivm::provider::{OciClient, OciSettings};
//!
//! # async fn run() -> Result<(), notivm::HunterError> {
//! let loaded = load_config(None)?;
//! let config = loaded.config;
//! config.validate()?;
//!
//! let provider = Arc::new(OciClient::new(OciSettings::from_config(&config)?)?);
//! let channel = Arc::new(TelegramChannel::from_config(&config.notification)?);
//! let orchestrator = Orchestrator::from_config(&config, provider, channel)?;
//!
//! if let Some(instance) = orchestrator.run_until_success_or_exhausted().await {
//!     println!("{} is running", instance.instance_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod guard;
#[cfg(feature = "health")]
pub mod health;
pub mod lifecycle;
pub mod notify;
pub mod orchestrator;
pub mod provider;
pub mod region;
pub mod retry;

#[cfg(test)]
mod fakes;

pub use error::HunterError;
pub use lifecycle::{LifecycleWaiter, WaitOutcome};
pub use notify::{NotificationChannel, Notifier};
pub use orchestrator::{AttemptOutcome, Orchestrator, RunPhase, RunStatus};
pub use provider::{ProvisionedInstance, ProvisioningApi};
pub use region::RegionPolicyResolver;
pub use retry::{Backoff, RetryPolicy};
