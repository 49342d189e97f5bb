use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    pub enabled: bool,
    pub key: Option<SecretString>,
    pub key_file: Option<String>,
    pub server_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: None,
            key_file: None,
            server_url: None,
            timeout_secs: 10,
        }
    }
}
