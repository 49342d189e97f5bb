use std::time::Duration;

use chrono::{DateTime, TimeZone};

use crate::config::{ConfigError, HunterConfig, RunnerConfig};
use crate::provider::{Placement, ProvisionRequest};

/// Everything needed to build a launch request except the per-attempt name and placement.
#[derive(Debug, Clone)]
pub struct LaunchTemplate {
    pub compartment_id: String,
    pub shape: String,
    pub ocpus: u32,
    pub memory_gb: u32,
    pub boot_volume_gb: u32,
    pub image_id: String,
    /// Pinned placement; looked up from the provider when unset.
    pub subnet_id: Option<String>,
    pub availability_domain: Option<String>,
    pub name_prefix: String,
    pub assign_public_ip: bool,
}

impl LaunchTemplate {
    pub fn from_config(config: &HunterConfig, image_id: String) -> Result<Self, ConfigError> {
        let compartment_id = config
            .provider
            .compartment()
            .ok_or_else(|| ConfigError::Missing(vec!["provider.compartment_id".to_string()]))?
            .to_string();
        let instance = &config.instance;
        Ok(Self {
            compartment_id,
            shape: instance.shape.clone(),
            ocpus: instance.ocpus,
            memory_gb: instance.memory_gb,
            boot_volume_gb: instance.boot_volume_gb,
            image_id,
            subnet_id: instance.subnet_id.clone(),
            availability_domain: instance.availability_domain.clone(),
            name_prefix: instance.name_prefix.clone(),
            assign_public_ip: instance.assign_public_ip,
        })
    }

    pub(crate) fn request(&self, display_name: String, placement: Placement) -> ProvisionRequest {
        ProvisionRequest {
            display_name,
            compartment_id: self.compartment_id.clone(),
            shape: self.shape.clone(),
            ocpus: self.ocpus,
            memory_gb: self.memory_gb,
            boot_volume_gb: self.boot_volume_gb,
            image_id: self.image_id.clone(),
            subnet_id: placement.subnet_id,
            availability_domain: placement.availability_domain,
            assign_public_ip: self.assign_public_ip,
        }
    }
}

/// `<prefix>-<YYYYmmdd-HHMMSS>-<attempt:04>`.
pub(crate) fn display_name<Tz>(prefix: &str, now: DateTime<Tz>, attempt: u32) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix}-{}-{attempt:04}", now.format("%Y%m%d-%H%M%S"))
}

/// Fixed delays of the attempt loop and the continuous driver.
#[derive(Debug, Clone)]
pub struct RunnerTiming {
    pub lifecycle_timeout: Duration,
    pub poll_interval: Duration,
    pub restart_delay: Duration,
    pub crash_delay: Duration,
    pub max_restarts: Option<u32>,
}

impl From<&RunnerConfig> for RunnerTiming {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            lifecycle_timeout: Duration::from_secs(config.lifecycle_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            restart_delay: Duration::from_secs(config.restart_delay_secs),
            crash_delay: Duration::from_secs(config.crash_delay_secs),
            max_restarts: config.max_restarts,
        }
    }
}

impl Default for RunnerTiming {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}
