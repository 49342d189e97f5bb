//! Region-aware retry tuning and image selection.

use std::collections::BTreeMap;

use crate::config::{ConfigError, HunterConfig, RegionProfile, RetryConfig};
use crate::retry::RetryPolicy;

/// Region whose image is used when neither the profile nor the catalog knows the active one.
pub const BASELINE_REGION: &str = "ap-seoul-1";

const BUILTIN_IMAGES: &[(&str, &str)] = &[
    (
        "ap-seoul-1",
        "ocid1.image.oc1.ap-seoul-1.aaaaaaaaxwd4dl4mczkmvqzxtmsncrwxlbwlfs3dxlnbg7nxxhjdzw6mokoq",
    ),
    (
        "ap-chuncheon-1",
        "ocid1.image.oc1.ap-chuncheon-1.aaaaaaaa3t7bfbuakyo27zsesuvvkbztbwezc6tlsidi3bqbysx6gvpcq6aq",
    ),
    (
        "ap-tokyo-1",
        "ocid1.image.oc1.ap-tokyo-1.aaaaaaaazdvadk6qc5dtlrsn2xjx6tcvt2q6pehvuqzacfpqx4ytq3wrvkqq",
    ),
    (
        "ap-osaka-1",
        "ocid1.image.oc1.ap-osaka-1.aaaaaaaacbw6twq4w7fmc4khkz2n6ahrzkdcy3czmdv4swbfqxzytq2mq6ya",
    ),
    (
        "us-ashburn-1",
        "ocid1.image.oc1.iad.aaaaaaaahh6kyczoyjd6n4ka5a3qbnjvd2xvwq3g5jdqcpnnt6k4fcw3gjkq",
    ),
    (
        "us-phoenix-1",
        "ocid1.image.oc1.phx.aaaaaaaavtt7pqbytpjgjgxkbtwxbplg6c2cdw4zvnilpdaxxqucjcx2a7uq",
    ),
    (
        "eu-frankfurt-1",
        "ocid1.image.oc1.eu-frankfurt-1.aaaaaaaa5x6ldqxhtqmfehyxksc4gkzagmzxjnugl4pjh4k5cggy3y6ovzdq",
    ),
];

/// Region → image table with a baseline fallback.
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    images: BTreeMap<String, String>,
    baseline_region: String,
}

impl ImageCatalog {
    pub fn new(images: BTreeMap<String, String>, baseline_region: impl Into<String>) -> Self {
        Self {
            images,
            baseline_region: baseline_region.into(),
        }
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Self {
        let images = BUILTIN_IMAGES
            .iter()
            .map(|(region, image)| (region.to_string(), image.to_string()))
            .collect();
        Self::new(images, BASELINE_REGION)
    }

    /// Layers operator-supplied entries over the current table.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (region, image) in overrides {
            self.images.insert(region.clone(), image.clone());
        }
        self
    }

    pub fn lookup(&self, region: &str) -> Option<&str> {
        self.images.get(region).map(String::as_str)
    }

    pub fn baseline(&self) -> Option<&str> {
        self.lookup(&self.baseline_region)
    }
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Merges per-region profiles over the global retry defaults.
#[derive(Debug, Clone)]
pub struct RegionPolicyResolver {
    defaults: RetryConfig,
    profiles: BTreeMap<String, RegionProfile>,
    catalog: ImageCatalog,
}

impl RegionPolicyResolver {
    pub fn new(
        defaults: RetryConfig,
        profiles: BTreeMap<String, RegionProfile>,
        catalog: ImageCatalog,
    ) -> Self {
        Self {
            defaults,
            profiles,
            catalog,
        }
    }

    pub fn from_config(config: &HunterConfig) -> Self {
        Self::new(
            config.retry.clone(),
            config.regions.clone(),
            ImageCatalog::builtin().with_overrides(&config.images),
        )
    }

    pub fn profile(&self, region: &str) -> Option<&RegionProfile> {
        self.profiles.get(region)
    }

    /// Retry policy for `region`.
    ///
    /// A region without a profile is not an error: the global defaults apply.
    pub fn resolve(&self, region: &str) -> Result<RetryPolicy, ConfigError> {
        let profile = self.profile(region);
        let max_attempts = profile
            .and_then(|p| p.max_attempts)
            .unwrap_or(self.defaults.max_attempts);
        let initial_wait = profile
            .and_then(|p| p.retry_interval_secs)
            .unwrap_or(self.defaults.initial_wait_secs);
        let mut max_wait = self.defaults.max_wait_secs;
        if initial_wait > max_wait {
            log::debug!(
                "raising max wait from {max_wait}s to the {initial_wait}s interval of {region}"
            );
            max_wait = initial_wait;
        }

        match profile {
            Some(p) => log::info!(
                "region-tuned retry settings for {region}{}: max_attempts={max_attempts}, retry_interval={initial_wait}s",
                p.description
                    .as_deref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            ),
            None => log::warn!("no region-specific config for {region}, using defaults"),
        }

        RetryPolicy::new(
            max_attempts,
            initial_wait,
            max_wait,
            self.defaults.multiplier,
        )
    }

    /// Image to launch in `region`: profile, then catalog, then the baseline region's image.
    pub fn preferred_image(&self, region: &str) -> Result<String, ConfigError> {
        if let Some(image) = self.profile(region).and_then(|p| p.preferred_image_id.as_deref()) {
            return Ok(image.to_string());
        }
        if let Some(image) = self.catalog.lookup(region) {
            return Ok(image.to_string());
        }
        match self.catalog.baseline() {
            Some(image) => {
                log::warn!("no image known for {region}, falling back to the baseline image");
                Ok(image.to_string())
            }
            None => Err(ConfigError::Invalid(format!(
                "no image configured for region {region}"
            ))),
        }
    }
}
