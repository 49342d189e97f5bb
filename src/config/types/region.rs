use serde::Deserialize;

/// Per-region overrides; every field falls back to the global value when unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionProfile {
    pub max_attempts: Option<u32>,
    #[serde(alias = "retry_interval")]
    pub retry_interval_secs: Option<f64>,
    #[serde(alias = "image_id")]
    pub preferred_image_id: Option<String>,
    pub description: Option<String>,
}
