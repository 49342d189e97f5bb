use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::HunterConfig;
use crate::error::HunterError;
use crate::fakes::{FakeChannel, FakeProvider};
use crate::notify::MessageTemplates;

fn template() -> LaunchTemplate {
    LaunchTemplate {
        compartment_id: "ocid1.compartment.test".to_string(),
        shape: "VM.Standard.A1.Flex".to_string(),
        ocpus: 2,
        memory_gb: 12,
        boot_volume_gb: 50,
        image_id: "ocid1.image.test".to_string(),
        subnet_id: None,
        availability_domain: None,
        name_prefix: "AutoVM".to_string(),
        assign_public_ip: true,
    }
}

/// Three polls per lifecycle wait keep the paused-clock runs short.
fn timing(max_restarts: Option<u32>) -> RunnerTiming {
    RunnerTiming {
        lifecycle_timeout: Duration::from_secs(30),
        poll_interval: Duration::from_secs(10),
        restart_delay: Duration::from_secs(300),
        crash_delay: Duration::from_secs(60),
        max_restarts,
    }
}

fn orchestrator(
    provider: &Arc<FakeProvider>,
    channel: &Arc<FakeChannel>,
    max_attempts: u32,
    max_restarts: Option<u32>,
) -> Orchestrator {
    let policy = RetryPolicy::new(max_attempts, 1.0, 2.0, 1.5).unwrap();
    with_policy(provider, channel, policy, max_restarts)
}

fn with_policy(
    provider: &Arc<FakeProvider>,
    channel: &Arc<FakeChannel>,
    policy: RetryPolicy,
    max_restarts: Option<u32>,
) -> Orchestrator {
    let notifier = Notifier::new(channel.clone(), MessageTemplates::default());
    Orchestrator::new(
        provider.clone(),
        notifier,
        policy,
        template(),
        timing(max_restarts),
    )
    .with_seed(7)
}

fn rate_limited() -> FakeProvider {
    FakeProvider::new().creates_with(|_, _| {
        Err(HunterError::RateLimited(
            "Too many requests for the user".to_string(),
        ))
    })
}

#[tokio::test(start_paused = true)]
async fn exhausts_budget_when_every_create_is_rate_limited() {
    let provider = Arc::new(rate_limited());
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());

    assert_eq!(provider.create_calls(), 3);
    assert_eq!(channel.count_containing("Launch failed"), 3);
    assert_eq!(channel.count_containing("Instance hunt failed"), 1);
    assert_eq!(channel.count_containing("Launch attempt"), 3);

    let status = orch.status().borrow().clone();
    assert_eq!(status.phase, RunPhase::Exhausted);
    assert!(status
        .last_error
        .unwrap_or_default()
        .contains("rate limit exceeded"));
}

#[tokio::test(start_paused = true)]
async fn plain_failures_stay_quiet_until_the_fiftieth_attempt() {
    let provider = Arc::new(FakeProvider::new().failing_creates("Out of host capacity."));
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(channel.count_containing("Launch failed"), 0);
    assert_eq!(channel.count_containing("Out of host capacity."), 1);
}

#[tokio::test(start_paused = true)]
async fn waits_over_a_minute_are_announced() {
    let provider = Arc::new(FakeProvider::new().failing_creates("Out of host capacity."));
    let channel = Arc::new(FakeChannel::new());
    let policy = RetryPolicy::new(3, 61.0, 120.0, 1.5).unwrap();
    let orch = with_policy(&provider, &channel, policy, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(channel.count_containing("Waiting to retry"), 2);
}

#[tokio::test(start_paused = true)]
async fn short_waits_are_not_announced() {
    // 50s plus 20% jitter never exceeds a minute.
    let provider = Arc::new(FakeProvider::new().failing_creates("Out of host capacity."));
    let channel = Arc::new(FakeChannel::new());
    let policy = RetryPolicy::new(6, 10.0, 50.0, 2.0).unwrap();
    let orch = with_policy(&provider, &channel, policy, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(provider.create_calls(), 6);
    assert_eq!(channel.count_containing("Waiting to retry"), 0);
}

#[tokio::test(start_paused = true)]
async fn returns_instance_running_on_first_poll() {
    let provider = Arc::new(FakeProvider::new().running_after(1));
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    let instance = orch.run_until_success_or_exhausted().await.unwrap();

    assert_eq!(instance.instance_id, "ocid1.instance.1");
    assert_eq!(instance.public_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(provider.create_calls(), 1);
    assert!(provider.terminated().is_empty());
    assert_eq!(channel.count_containing("The instance is up"), 1);

    let status = orch.status().borrow().clone();
    assert_eq!(status.phase, RunPhase::Succeeded);
    assert_eq!(status.attempt, 1);
    assert_eq!(status.instance_id.as_deref(), Some("ocid1.instance.1"));
}

#[tokio::test(start_paused = true)]
async fn terminates_instance_that_never_comes_up_and_retries() {
    // Attempt 1 spends three polls; the fourth poll belongs to attempt 2.
    let provider = Arc::new(FakeProvider::new().running_after(4));
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    let instance = orch.run_until_success_or_exhausted().await.unwrap();

    assert_eq!(provider.terminated(), vec!["ocid1.instance.1".to_string()]);
    assert_eq!(provider.create_calls(), 2);
    assert_eq!(instance.instance_id, "ocid1.instance.2");
}

#[tokio::test(start_paused = true)]
async fn refused_termination_does_not_stop_the_run() {
    let provider = Arc::new(FakeProvider::new().never_running().refusing_termination());
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 2, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(provider.create_calls(), 2);
    assert_eq!(provider.terminated().len(), 2);
    assert_eq!(
        orch.status().borrow().last_error.as_deref(),
        Some("instance created but failed to reach RUNNING state")
    );
}

#[tokio::test(start_paused = true)]
async fn unreachable_channel_aborts_before_any_attempt() {
    let provider = Arc::new(FakeProvider::new());
    let channel = Arc::new(FakeChannel::new().unreachable());
    let orch = orchestrator(&provider, &channel, 3, None);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(provider.create_calls(), 0);
    assert_eq!(orch.status().borrow().phase, RunPhase::Aborted);
}

#[tokio::test(start_paused = true)]
async fn undelivered_notices_do_not_abort_the_run() {
    let provider = Arc::new(FakeProvider::new().running_after(1));
    let channel = Arc::new(FakeChannel::new().dropping_messages());
    let orch = orchestrator(&provider, &channel, 3, None);

    assert!(orch.run_until_success_or_exhausted().await.is_some());
    assert!(!channel.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn each_attempt_gets_a_unique_name_and_discovered_placement() {
    let provider = Arc::new(FakeProvider::new().failing_creates("Out of host capacity."));
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    orch.run_until_success_or_exhausted().await;

    let requests = provider.requests();
    let names: HashSet<&str> = requests.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names.len(), 3);
    for (index, request) in requests.iter().enumerate() {
        assert!(request.display_name.starts_with("AutoVM-"));
        assert!(request
            .display_name
            .ends_with(&format!("-{:04}", index + 1)));
        assert_eq!(request.availability_domain, "AD-1");
        assert_eq!(request.subnet_id, "ocid1.subnet.fake");
        assert_eq!(request.image_id, "ocid1.image.test");
    }
}

#[tokio::test(start_paused = true)]
async fn pinned_placement_skips_discovery() {
    let provider = Arc::new(FakeProvider::new());
    let channel = Arc::new(FakeChannel::new());
    let mut pinned = template();
    pinned.availability_domain = Some("AD-3".to_string());
    pinned.subnet_id = Some("ocid1.subnet.pinned".to_string());
    let orch = Orchestrator::new(
        provider.clone(),
        Notifier::new(channel.clone(), MessageTemplates::default()),
        RetryPolicy::new(1, 1.0, 2.0, 1.5).unwrap(),
        pinned,
        timing(None),
    );

    orch.run_until_success_or_exhausted().await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.availability_domain, "AD-3");
    assert_eq!(request.subnet_id, "ocid1.subnet.pinned");
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_wait_terminates_the_pending_instance() {
    let provider = Arc::new(FakeProvider::new().never_running());
    let channel = Arc::new(FakeChannel::new());
    let cancel = CancellationToken::new();
    let orch = orchestrator(&provider, &channel, 3, None).with_cancellation(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        cancel.cancel();
    });

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(provider.create_calls(), 1);
    assert_eq!(provider.terminated(), vec!["ocid1.instance.1".to_string()]);
    assert_eq!(orch.status().borrow().phase, RunPhase::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_makes_no_attempt() {
    let provider = Arc::new(FakeProvider::new());
    let channel = Arc::new(FakeChannel::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let orch = orchestrator(&provider, &channel, 3, None).with_cancellation(cancel);

    assert!(orch.run_until_success_or_exhausted().await.is_none());
    assert_eq!(provider.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn continuous_driver_restarts_exhausted_runs_up_to_the_limit() {
    let provider = Arc::new(rate_limited());
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 2, Some(1));

    assert!(orch.run_continuous().await.is_none());

    assert_eq!(provider.create_calls(), 4);
    assert_eq!(channel.count_containing("Instance hunt failed"), 2);
    assert_eq!(channel.count_containing("Instance hunt started"), 2);
    assert_eq!(orch.status().borrow().run, 2);
}

#[tokio::test(start_paused = true)]
async fn continuous_driver_recovers_from_a_crashed_run() {
    let provider = Arc::new(FakeProvider::new().creates_with(|n, _| {
        if n == 1 {
            panic!("boom");
        }
        Ok(format!("ocid1.instance.{n}"))
    }));
    let channel = Arc::new(FakeChannel::new());
    let orch = orchestrator(&provider, &channel, 3, None);

    let instance = orch.run_continuous().await.unwrap();

    assert_eq!(instance.instance_id, "ocid1.instance.2");
    assert_eq!(channel.count_containing("Unexpected error: boom"), 1);
}

#[tokio::test(start_paused = true)]
async fn continuous_driver_stops_on_cancellation() {
    let provider = Arc::new(rate_limited());
    let channel = Arc::new(FakeChannel::new());
    let cancel = CancellationToken::new();
    let orch = orchestrator(&provider, &channel, 1, None).with_cancellation(cancel.clone());

    tokio::spawn(async move {
        // Lands inside the first restart delay.
        tokio::time::sleep(Duration::from_secs(120)).await;
        cancel.cancel();
    });

    assert!(orch.run_continuous().await.is_none());
    assert_eq!(provider.create_calls(), 1);
    assert_eq!(channel.count_containing("Instance hunt stopped"), 1);
}

#[test]
fn from_config_resolves_region_policy_and_image() {
    let mut config = HunterConfig::default();
    config.provider.compartment_id = Some("ocid1.compartment.test".to_string());
    let orch = Orchestrator::from_config(
        &config,
        Arc::new(FakeProvider::new()),
        Arc::new(FakeChannel::new()),
    )
    .unwrap();

    assert_eq!(orch.policy().max_attempts(), 1000);
    assert!(orch.template().image_id.starts_with("ocid1.image."));

    let single = orch.with_max_attempts(1).unwrap();
    assert_eq!(single.policy().max_attempts(), 1);
    assert_eq!(single.status().borrow().max_attempts, 1);
}

#[test]
fn from_config_prefers_pinned_image() {
    let mut config = HunterConfig::default();
    config.provider.compartment_id = Some("ocid1.compartment.test".to_string());
    config.instance.image_id = Some("ocid1.image.pinned".to_string());
    let orch = Orchestrator::from_config(
        &config,
        Arc::new(FakeProvider::new()),
        Arc::new(FakeChannel::new()),
    )
    .unwrap();

    assert_eq!(orch.template().image_id, "ocid1.image.pinned");
}

#[test]
fn from_config_requires_a_compartment() {
    let config = HunterConfig::default();
    let result = Orchestrator::from_config(
        &config,
        Arc::new(FakeProvider::new()),
        Arc::new(FakeChannel::new()),
    );
    assert!(matches!(result, Err(HunterError::Config(_))));
}
