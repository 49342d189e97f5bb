use serde::Deserialize;

use super::DEFAULT_HEALTH_BIND;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: DEFAULT_HEALTH_BIND.to_string(),
        }
    }
}
