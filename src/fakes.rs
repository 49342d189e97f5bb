//! In-memory stand-ins for the provider and the chat channel.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::HunterError;
use crate::notify::NotificationChannel;
use crate::provider::{LifecycleState, ProvisionRequest, ProvisionedInstance, ProvisioningApi};

type CreateScript = Box<dyn Fn(u32, &ProvisionRequest) -> Result<String, HunterError> + Send + Sync>;

/// Scripted provider. Every create succeeds with id `ocid1.instance.<n>` unless told otherwise.
pub(crate) struct FakeProvider {
    create: CreateScript,
    running_after: Option<u32>,
    failing_state_queries: u32,
    terminate_ok: bool,
    create_calls: AtomicU32,
    details_calls: AtomicU32,
    requests: Mutex<Vec<ProvisionRequest>>,
    terminated: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self {
            create: Box::new(|n, _| Ok(format!("ocid1.instance.{n}"))),
            running_after: Some(1),
            failing_state_queries: 0,
            terminate_ok: true,
            create_calls: AtomicU32::new(0),
            details_calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            terminated: Mutex::new(Vec::new()),
        }
    }

    /// Every create fails with `message`.
    pub(crate) fn failing_creates(mut self, message: &'static str) -> Self {
        self.create = Box::new(move |_, _| Err(HunterError::Generic(message.to_string())));
        self
    }

    pub(crate) fn creates_with<F>(mut self, script: F) -> Self
    where
        F: Fn(u32, &ProvisionRequest) -> Result<String, HunterError> + Send + Sync + 'static,
    {
        self.create = Box::new(script);
        self
    }

    /// Instances report RUNNING from the `polls`-th state query on.
    pub(crate) fn running_after(mut self, polls: u32) -> Self {
        self.running_after = Some(polls);
        self
    }

    pub(crate) fn never_running(mut self) -> Self {
        self.running_after = None;
        self
    }

    /// The first `count` state queries fail.
    pub(crate) fn failing_state_queries(mut self, count: u32) -> Self {
        self.failing_state_queries = count;
        self
    }

    pub(crate) fn refusing_termination(mut self) -> Self {
        self.terminate_ok = false;
        self
    }

    pub(crate) fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn running_polls(&self) -> u32 {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<ProvisionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn terminated(&self) -> Vec<String> {
        self.terminated.lock().expect("terminated lock").clone()
    }

    fn instance(id: &str, state: LifecycleState) -> ProvisionedInstance {
        ProvisionedInstance {
            instance_id: id.to_string(),
            display_name: format!("name-of-{id}"),
            lifecycle_state: state,
            availability_domain: "AD-1".to_string(),
            shape: "VM.Standard.A1.Flex".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            public_ip: None,
            private_ip: None,
        }
    }
}

#[async_trait]
impl ProvisioningApi for FakeProvider {
    async fn create_instance(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedInstance, HunterError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let id = (self.create)(n, request)?;
        Ok(Self::instance(&id, LifecycleState::Provisioning))
    }

    async fn get_instance_details(
        &self,
        instance_id: &str,
    ) -> Result<ProvisionedInstance, HunterError> {
        let n = self.details_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failing_state_queries {
            return Err(HunterError::Network("connection reset".to_string()));
        }
        let state = match self.running_after {
            Some(after) if n >= after => LifecycleState::Running,
            _ => LifecycleState::Provisioning,
        };
        let mut instance = Self::instance(instance_id, state);
        instance.public_ip = Some("203.0.113.7".to_string());
        instance.private_ip = Some("10.0.0.12".to_string());
        Ok(instance)
    }

    async fn terminate_instance(&self, instance_id: &str) -> bool {
        self.terminated
            .lock()
            .expect("terminated lock")
            .push(instance_id.to_string());
        self.terminate_ok
    }

    async fn availability_domains(&self) -> Result<Vec<String>, HunterError> {
        Ok(vec!["AD-1".to_string(), "AD-2".to_string()])
    }

    async fn default_subnet(&self) -> Result<Option<String>, HunterError> {
        Ok(Some("ocid1.subnet.fake".to_string()))
    }
}

/// Records every message; connectivity and delivery are switchable.
pub(crate) struct FakeChannel {
    reachable: bool,
    deliver: bool,
    sent: Mutex<Vec<String>>,
}

impl FakeChannel {
    pub(crate) fn new() -> Self {
        Self {
            reachable: true,
            deliver: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub(crate) fn dropping_messages(mut self) -> Self {
        self.deliver = false;
        self
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn count_containing(&self, needle: &str) -> usize {
        self.sent().iter().filter(|m| m.contains(needle)).count()
    }
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    async fn send_message(&self, text: &str) -> bool {
        self.sent.lock().expect("sent lock").push(text.to_string());
        self.deliver
    }

    async fn test_connection(&self) -> bool {
        self.reachable
    }
}
