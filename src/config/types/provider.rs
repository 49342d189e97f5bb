use secrecy::SecretString;
use serde::Deserialize;

use super::DEFAULT_PROVIDER_TIMEOUT_SECS;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub tenancy_id: Option<String>,
    pub user_id: Option<String>,
    /// Fingerprint of the uploaded API signing key.
    pub fingerprint: Option<String>,
    pub private_key_path: Option<String>,
    pub compartment_id: Option<String>,
    pub compute_endpoint: Option<String>,
    pub identity_endpoint: Option<String>,
    pub auth_token: Option<SecretString>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            tenancy_id: None,
            user_id: None,
            fingerprint: None,
            private_key_path: None,
            compartment_id: None,
            compute_endpoint: None,
            identity_endpoint: None,
            auth_token: None,
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Compartment instances are launched into; the tenancy root when unset.
    pub fn compartment(&self) -> Option<&str> {
        self.compartment_id
            .as_deref()
            .or(self.tenancy_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    /// API-key settings that are still unset, named with their environment variables.
    ///
    /// Empty when a bearer token is configured instead.
    pub fn missing_credentials(&self) -> Vec<String> {
        if self.auth_token.is_some() {
            return Vec::new();
        }
        [
            (&self.tenancy_id, "provider.tenancy_id (OCI_TENANCY_OCID)"),
            (&self.user_id, "provider.user_id (OCI_USER_OCID)"),
            (&self.fingerprint, "provider.fingerprint (OCI_FINGERPRINT)"),
            (&self.private_key_path, "provider.private_key_path (OCI_PRIVATE_KEY_PATH)"),
        ]
        .into_iter()
        .filter(|(value, _)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(_, name)| name.to_string())
        .collect()
    }

    pub fn compute_endpoint_for(&self, region: &str) -> String {
        self.compute_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://iaas.{region}.oraclecloud.com"))
    }

    pub fn identity_endpoint_for(&self, region: &str) -> String {
        self.identity_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://identity.{region}.oraclecloud.com"))
    }
}
