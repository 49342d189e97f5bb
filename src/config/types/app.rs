use serde::Deserialize;
use std::collections::BTreeMap;

use super::{
    HealthConfig, InstanceConfig, LicenseConfig, LoggingConfig, NotificationConfig,
    ProviderConfig, RegionProfile, RetryConfig, RunnerConfig, DEFAULT_REGION,
};
use crate::config::ConfigError;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    /// Region the instance is launched in.
    pub region: String,
    /// Global retry defaults, overridden per region by `regions`.
    pub retry: RetryConfig,
    pub regions: BTreeMap<String, RegionProfile>,
    /// Extra or replacement entries for the built-in region image table.
    pub images: BTreeMap<String, String>,
    pub instance: InstanceConfig,
    pub provider: ProviderConfig,
    pub notification: NotificationConfig,
    pub runner: RunnerConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
    pub license: LicenseConfig,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            retry: RetryConfig::default(),
            regions: BTreeMap::new(),
            images: BTreeMap::new(),
            instance: InstanceConfig::default(),
            provider: ProviderConfig::default(),
            notification: NotificationConfig::default(),
            runner: RunnerConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig::default(),
            license: LicenseConfig::default(),
        }
    }
}

impl HunterConfig {
    /// Checks that everything needed to talk to the provider and the chat is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.region.trim().is_empty() {
            missing.push("region (OCI_REGION)".to_string());
        }
        if self.provider.compartment().is_none() {
            missing.push(
                "provider.compartment_id or provider.tenancy_id (VM_COMPARTMENT_OCID / OCI_TENANCY_OCID)"
                    .to_string(),
            );
        }
        missing.extend(self.provider.missing_credentials());
        if self.notification.bot_token.is_none() {
            missing.push("notification.bot_token (TELEGRAM_BOT_TOKEN)".to_string());
        }
        if self.notification.chat_id.is_none() {
            missing.push("notification.chat_id (TELEGRAM_CHAT_ID)".to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        if self.runner.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "runner.poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
