//! The retry state machine: one orchestrator drives bounded runs of launch
//! attempts, and the continuous driver restarts exhausted runs.

mod continuous;
mod run;
mod status;
mod template;

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, HunterConfig};
use crate::error::HunterError;
use crate::lifecycle::LifecycleWaiter;
use crate::notify::{InstanceSummary, MessageTemplates, NotificationChannel, Notifier};
use crate::provider::{ProvisionedInstance, ProvisioningApi};
use crate::region::RegionPolicyResolver;
use crate::retry::RetryPolicy;

pub use status::{RunPhase, RunStatus};
pub use template::{LaunchTemplate, RunnerTiming};

/// Result of a single launch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(ProvisionedInstance),
    TransientFailure(String),
    FatalFailure(String),
    Cancelled,
}

/// How a bounded run ended.
#[derive(Debug)]
enum RunOutcome {
    Succeeded(ProvisionedInstance),
    Exhausted,
    Aborted,
    Cancelled,
}

impl RunOutcome {
    fn into_instance(self) -> Option<ProvisionedInstance> {
        match self {
            RunOutcome::Succeeded(instance) => Some(instance),
            _ => None,
        }
    }
}

/// Keeps launching instances until one reaches RUNNING or the attempt budget runs out.
pub struct Orchestrator {
    provider: Arc<dyn ProvisioningApi>,
    notifier: Notifier,
    policy: RetryPolicy,
    template: LaunchTemplate,
    timing: RunnerTiming,
    cancel: CancellationToken,
    status: watch::Sender<RunStatus>,
    seed: Option<u64>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ProvisioningApi>,
        notifier: Notifier,
        policy: RetryPolicy,
        template: LaunchTemplate,
        timing: RunnerTiming,
    ) -> Self {
        let (status, _) = watch::channel(RunStatus::idle(policy.max_attempts()));
        Self {
            provider,
            notifier,
            policy,
            template,
            timing,
            cancel: CancellationToken::new(),
            status,
            seed: None,
        }
    }

    /// Wires the orchestrator from startup configuration.
    ///
    /// The retry policy and image come from the region resolver unless the
    /// instance section pins an image.
    pub fn from_config(
        config: &HunterConfig,
        provider: Arc<dyn ProvisioningApi>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self, HunterError> {
        let resolver = RegionPolicyResolver::from_config(config);
        let policy = resolver.resolve(&config.region)?;
        let image_id = match &config.instance.image_id {
            Some(image) => image.clone(),
            None => resolver.preferred_image(&config.region)?,
        };
        let template = LaunchTemplate::from_config(config, image_id)?;
        let notifier = Notifier::new(
            channel,
            MessageTemplates::from_config(&config.notification),
        );
        Ok(Self::new(
            provider,
            notifier,
            policy,
            template,
            RunnerTiming::from(&config.runner),
        ))
    }

    /// Shutdown token; cancelling it stops sleeps and polls promptly.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Seeds the backoff jitter so wait times are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the attempt budget, keeping the rest of the policy.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, ConfigError> {
        self.policy = self.policy.with_max_attempts(max_attempts)?;
        self.status
            .send_modify(|status| status.max_attempts = max_attempts);
        Ok(self)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn template(&self) -> &LaunchTemplate {
        &self.template
    }

    /// Live view of the run status.
    pub fn status(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    fn waiter(&self) -> LifecycleWaiter {
        LifecycleWaiter::new(
            self.provider.clone(),
            self.timing.poll_interval,
            self.cancel.clone(),
        )
    }

    fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            shape: self.template.shape.clone(),
            ocpus: self.template.ocpus,
            memory_gb: self.template.memory_gb,
            boot_volume_gb: self.template.boot_volume_gb,
        }
    }

    fn publish(&self, phase: RunPhase, attempt: u32) {
        self.status.send_modify(|status| {
            status.phase = phase;
            status.attempt = attempt;
            status.updated_at = chrono::Utc::now();
        });
    }

    /// Sleeps for `duration`; `false` when shutdown interrupted the sleep.
    async fn pause(&self, duration: std::time::Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests;
