//! Waiting for a freshly launched instance to come up.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::provider::ProvisioningApi;

/// How a wait for RUNNING ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    ReachedRunning,
    TimedOut,
    Cancelled,
}

/// Polls the provider on a fixed interval until an instance reports RUNNING.
pub struct LifecycleWaiter {
    provider: Arc<dyn ProvisioningApi>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl LifecycleWaiter {
    pub fn new(
        provider: Arc<dyn ProvisioningApi>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            poll_interval,
            cancel,
        }
    }

    /// Polls until RUNNING, `timeout` elapses, or shutdown is requested.
    ///
    /// Query failures count as "not ready yet"; only the timeout ends a wait
    /// against a provider that keeps failing.
    pub async fn await_running(&self, instance_id: &str, timeout: Duration) -> WaitOutcome {
        log::info!("waiting for instance {instance_id} to reach RUNNING state");
        let started = Instant::now();

        while started.elapsed() < timeout {
            let running = tokio::select! {
                _ = self.cancel.cancelled() => return WaitOutcome::Cancelled,
                running = self.provider.is_running(instance_id) => running,
            };
            if running {
                log::info!("instance {instance_id} is now RUNNING");
                return WaitOutcome::ReachedRunning;
            }
            log::debug!("instance {instance_id} not ready yet, waiting...");

            tokio::select! {
                _ = self.cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = sleep(self.poll_interval) => {}
            }
        }

        log::warn!(
            "instance {instance_id} did not reach RUNNING state within {}s",
            timeout.as_secs()
        );
        WaitOutcome::TimedOut
    }
}
