use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-reported lifecycle state of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Provisioning,
    Starting,
    Running,
    Stopping,
    Stopped,
    Terminating,
    Terminated,
    Failed,
    Unknown(String),
}

impl LifecycleState {
    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Provisioning => "PROVISIONING",
            LifecycleState::Starting => "STARTING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Stopping => "STOPPING",
            LifecycleState::Stopped => "STOPPED",
            LifecycleState::Terminating => "TERMINATING",
            LifecycleState::Terminated => "TERMINATED",
            LifecycleState::Failed => "FAILED",
            LifecycleState::Unknown(raw) => raw,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }
}

impl From<String> for LifecycleState {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "PROVISIONING" => LifecycleState::Provisioning,
            "STARTING" => LifecycleState::Starting,
            "RUNNING" => LifecycleState::Running,
            "STOPPING" => LifecycleState::Stopping,
            "STOPPED" => LifecycleState::Stopped,
            "TERMINATING" => LifecycleState::Terminating,
            "TERMINATED" => LifecycleState::Terminated,
            "FAILED" => LifecycleState::Failed,
            _ => LifecycleState::Unknown(raw),
        }
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an instance lands inside the compartment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub availability_domain: String,
    pub subnet_id: String,
}

/// One launch request. Built fresh for every attempt so display names never collide.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    pub display_name: String,
    pub compartment_id: String,
    pub shape: String,
    pub ocpus: u32,
    pub memory_gb: u32,
    pub boot_volume_gb: u32,
    pub image_id: String,
    pub subnet_id: String,
    pub availability_domain: String,
    pub assign_public_ip: bool,
}

/// An instance as last reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionedInstance {
    pub instance_id: String,
    pub display_name: String,
    pub lifecycle_state: LifecycleState,
    pub availability_domain: String,
    pub shape: String,
    pub created_at: DateTime<Utc>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
}
