use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::{Orchestrator, RunOutcome, RunPhase};
use crate::provider::ProvisionedInstance;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Orchestrator {
    /// Repeats bounded runs until an instance is running or shutdown is requested.
    ///
    /// Exhausted and aborted runs restart after the restart delay. A run that
    /// panics is reported to the channel and restarted after the crash delay.
    pub async fn run_continuous(&self) -> Option<ProvisionedInstance> {
        let mut restarts: u32 = 0;
        loop {
            let delay = match AssertUnwindSafe(self.run_bounded()).catch_unwind().await {
                Ok(RunOutcome::Succeeded(instance)) => return Some(instance),
                Ok(RunOutcome::Cancelled) => {
                    self.notifier.stopped().await;
                    return None;
                }
                Ok(RunOutcome::Exhausted) | Ok(RunOutcome::Aborted) => {
                    log::info!(
                        "run finished without an instance, restarting in {}s",
                        self.timing.restart_delay.as_secs()
                    );
                    self.timing.restart_delay
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("run crashed: {message}");
                    self.notifier
                        .error(&format!("Unexpected error: {message}"), None)
                        .await;
                    self.timing.crash_delay
                }
            };

            if let Some(max_restarts) = self.timing.max_restarts {
                if restarts >= max_restarts {
                    log::warn!("restart limit of {max_restarts} reached, giving up");
                    return None;
                }
            }
            restarts += 1;
            self.publish(RunPhase::Restarting, 0);

            if !self.pause(delay).await {
                self.publish(RunPhase::Cancelled, 0);
                self.notifier.stopped().await;
                return None;
            }
        }
    }
}
