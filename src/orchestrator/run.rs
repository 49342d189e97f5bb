use std::time::Duration;

use chrono::Local;

use super::template::display_name;
use super::{AttemptOutcome, Orchestrator, RunOutcome, RunPhase};
use crate::error::HunterError;
use crate::lifecycle::WaitOutcome;
use crate::provider::{LifecycleState, Placement, ProvisionRequest, ProvisionedInstance};
use crate::retry::Backoff;

/// Waits longer than this are announced in the chat.
const RETRY_NOTICE_THRESHOLD: Duration = Duration::from_secs(60);
const PROGRESS_EVERY_ATTEMPT_UNTIL: u32 = 5;
const PROGRESS_INTERVAL: u32 = 10;
const ERROR_NOTICE_INTERVAL: u32 = 50;

fn wants_progress_notice(attempt: u32) -> bool {
    attempt <= PROGRESS_EVERY_ATTEMPT_UNTIL || attempt % PROGRESS_INTERVAL == 0
}

fn wants_error_notice(last_error: &str, attempt: u32) -> bool {
    let lower = last_error.to_lowercase();
    lower.contains("rate limit") || lower.contains("quota") || attempt % ERROR_NOTICE_INTERVAL == 0
}

impl Orchestrator {
    /// Runs one bounded hunt.
    ///
    /// Returns the running instance, or `None` when the channel self-test failed,
    /// every attempt failed, or shutdown was requested.
    pub async fn run_until_success_or_exhausted(&self) -> Option<ProvisionedInstance> {
        self.run_bounded().await.into_instance()
    }

    pub(super) async fn run_bounded(&self) -> RunOutcome {
        let max_attempts = self.policy.max_attempts();
        log::info!("starting instance hunt ({max_attempts} attempts)");
        self.status.send_modify(|status| {
            status.run += 1;
            status.last_error = None;
        });
        self.publish(RunPhase::Idle, 0);

        self.notifier.start(&self.summary()).await;
        if !self.notifier.test_connection().await {
            return self.abort(AttemptOutcome::FatalFailure(
                "notification channel connection test failed".to_string(),
            ));
        }

        let mut backoff = match self.seed {
            Some(seed) => Backoff::seeded(self.policy.clone(), seed),
            None => Backoff::new(self.policy.clone()),
        };
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                self.publish(RunPhase::Cancelled, attempt - 1);
                return RunOutcome::Cancelled;
            }
            self.publish(RunPhase::Attempting, attempt);
            log::info!("launch attempt {attempt}/{max_attempts}");
            if wants_progress_notice(attempt) {
                self.notifier.progress(attempt, max_attempts).await;
            }

            match self.attempt(attempt).await {
                AttemptOutcome::Success(instance) => {
                    self.status.send_modify(|status| {
                        status.instance_id = Some(instance.instance_id.clone());
                    });
                    self.publish(RunPhase::Succeeded, attempt);
                    self.notifier.success(&instance).await;
                    log::info!("instance launched after {attempt} attempts");
                    return RunOutcome::Succeeded(instance);
                }
                AttemptOutcome::Cancelled => {
                    log::info!("shutdown requested during attempt {attempt}");
                    self.publish(RunPhase::Cancelled, attempt);
                    return RunOutcome::Cancelled;
                }
                fatal @ AttemptOutcome::FatalFailure(_) => return self.abort(fatal),
                AttemptOutcome::TransientFailure(reason) => {
                    log::error!("attempt {attempt} failed: {reason}");
                    last_error = reason;
                    self.status
                        .send_modify(|status| status.last_error = Some(last_error.clone()));
                    if wants_error_notice(&last_error, attempt) {
                        self.notifier.error(&last_error, Some(attempt)).await;
                    }
                }
            }

            if attempt < max_attempts {
                let wait = backoff.compute_wait(attempt);
                log::info!("waiting {}s before next attempt...", wait.as_secs());
                self.publish(RunPhase::AwaitingRetry, attempt);
                if wait > RETRY_NOTICE_THRESHOLD {
                    self.notifier.retry(attempt, max_attempts, wait).await;
                }
                if !self.pause(wait).await {
                    self.publish(RunPhase::Cancelled, attempt);
                    return RunOutcome::Cancelled;
                }
            }
        }

        log::error!("all {max_attempts} attempts failed. Last error: {last_error}");
        self.publish(RunPhase::Exhausted, max_attempts);
        self.notifier.final_failure(max_attempts, &last_error).await;
        RunOutcome::Exhausted
    }

    fn abort(&self, outcome: AttemptOutcome) -> RunOutcome {
        if let AttemptOutcome::FatalFailure(reason) = &outcome {
            log::error!("aborting run: {reason}");
            self.status
                .send_modify(|status| status.last_error = Some(reason.clone()));
        }
        self.publish(RunPhase::Aborted, 0);
        RunOutcome::Aborted
    }

    /// One launch: create, wait for RUNNING, clean up if it never gets there.
    async fn attempt(&self, attempt: u32) -> AttemptOutcome {
        let request = match self.build_request(attempt).await {
            Ok(request) => request,
            Err(err) => return AttemptOutcome::TransientFailure(err.to_string()),
        };

        // Not raced against shutdown: a launch that lands must be seen so it can be cleaned up.
        let created = match self.provider.create_instance(&request).await {
            Ok(instance) => instance,
            Err(err) => return AttemptOutcome::TransientFailure(err.to_string()),
        };
        let instance_id = created.instance_id.clone();
        log::info!("instance created: {instance_id}");

        match self
            .waiter()
            .await_running(&instance_id, self.timing.lifecycle_timeout)
            .await
        {
            WaitOutcome::ReachedRunning => {
                let details = match self.provider.get_instance_details(&instance_id).await {
                    Ok(details) => details,
                    Err(err) => {
                        log::warn!("could not fetch details of {instance_id}: {err}");
                        ProvisionedInstance {
                            lifecycle_state: LifecycleState::Running,
                            ..created
                        }
                    }
                };
                AttemptOutcome::Success(details)
            }
            WaitOutcome::TimedOut => {
                log::warn!("instance {instance_id} created but not running, terminating...");
                self.cleanup(&instance_id).await;
                AttemptOutcome::TransientFailure(
                    "instance created but failed to reach RUNNING state".to_string(),
                )
            }
            WaitOutcome::Cancelled => {
                log::warn!("shutdown while waiting on {instance_id}, terminating it");
                self.cleanup(&instance_id).await;
                AttemptOutcome::Cancelled
            }
        }
    }

    async fn cleanup(&self, instance_id: &str) {
        if !self.provider.terminate_instance(instance_id).await {
            log::error!("instance {instance_id} could not be terminated and may still be billed");
        }
    }

    async fn build_request(&self, attempt: u32) -> Result<ProvisionRequest, HunterError> {
        let placement = self.placement().await?;
        let name = display_name(&self.template.name_prefix, Local::now(), attempt);
        Ok(self.template.request(name, placement))
    }

    async fn placement(&self) -> Result<Placement, HunterError> {
        let availability_domain = match &self.template.availability_domain {
            Some(domain) => domain.clone(),
            None => self
                .provider
                .availability_domains()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| HunterError::Generic("no availability domains found".to_string()))?,
        };
        let subnet_id = match &self.template.subnet_id {
            Some(subnet) => subnet.clone(),
            None => self
                .provider
                .default_subnet()
                .await?
                .ok_or_else(|| HunterError::Generic("no suitable subnet found".to_string()))?,
        };
        Ok(Placement {
            availability_domain,
            subnet_id,
        })
    }
}
