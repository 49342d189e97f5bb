//! Optional license check run once before the hunt starts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::LicenseConfig;
use crate::error::HunterError;

pub const PRODUCT_ID: &str = "ORACLE_VM_HUNTER";
const KEY_PREFIX: &str = "ORACLEVM";

/// How a key was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Online,
    Offline,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    product_id: &'a str,
    license_key: &'a str,
    machine_fingerprint: &'a str,
    timestamp: String,
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: bool,
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// `ORACLEVM-XXXX-XXXX-XXXX` with alphanumeric groups.
pub fn is_well_formed(key: &str) -> bool {
    let parts: Vec<&str> = key.split('-').collect();
    parts.len() == 4
        && parts[0] == KEY_PREFIX
        && parts[1..]
            .iter()
            .all(|p| p.len() == 4 && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Hashes sorted `key:value` facts joined by `|`, keeping 16 hex chars.
pub fn fingerprint_of(facts: &BTreeMap<&str, String>) -> String {
    let joined = facts
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(&joined)[..16].to_string()
}

fn host_facts() -> BTreeMap<&'static str, String> {
    let mut facts = BTreeMap::new();
    facts.insert("platform", std::env::consts::OS.to_string());
    facts.insert("machine", std::env::consts::ARCH.to_string());
    let node = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .ok()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .map(|n| n.trim().to_string())
        .unwrap_or_default();
    facts.insert("node", node);
    if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
        if let Some(model) = cpuinfo
            .lines()
            .find(|l| l.starts_with("model name"))
            .and_then(|l| l.split_once(':'))
        {
            facts.insert("cpu", model.1.trim().to_string());
        }
    }
    facts
}

pub fn machine_fingerprint() -> String {
    fingerprint_of(&host_facts())
}

/// Last key group expected for a machine when the license server is unreachable.
pub fn offline_suffix(fingerprint: &str) -> String {
    sha256_hex(&format!("{PRODUCT_ID}-{fingerprint}"))[..4].to_uppercase()
}

pub struct LicenseGuard {
    client: Client,
    server_url: Option<String>,
}

impl LicenseGuard {
    pub fn new(server_url: Option<String>, timeout: Duration) -> Result<Self, HunterError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            server_url: server_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    pub fn from_config(config: &LicenseConfig) -> Result<Self, HunterError> {
        Self::new(
            config.server_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Tries the license server first, then the offline check.
    pub async fn validate(&self, key: &str, fingerprint: &str) -> Result<Validation, HunterError> {
        if !is_well_formed(key) {
            return Err(HunterError::Guard("invalid license key format".to_string()));
        }
        if self.validate_online(key, fingerprint).await {
            return Ok(Validation::Online);
        }
        if key.ends_with(&offline_suffix(fingerprint)) {
            return Ok(Validation::Offline);
        }
        Err(HunterError::Guard(format!(
            "license validation failed (machine fingerprint {fingerprint})"
        )))
    }

    async fn validate_online(&self, key: &str, fingerprint: &str) -> bool {
        let Some(server) = &self.server_url else {
            return false;
        };
        let body = ValidateRequest {
            product_id: PRODUCT_ID,
            license_key: key,
            machine_fingerprint: fingerprint,
            timestamp: Utc::now().to_rfc3339(),
        };
        let response = match self
            .client
            .post(format!("{server}/validate"))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("online license validation failed: {}", e.without_url());
                return false;
            }
        };
        if !response.status().is_success() {
            log::warn!("license server returned {}", response.status());
            return false;
        }
        match response.json::<ValidateResponse>().await {
            Ok(result) => result.valid,
            Err(e) => {
                log::warn!("unreadable license server response: {}", e.without_url());
                false
            }
        }
    }
}

/// Key from the config (or its env override), else the key file.
pub fn locate_key(config: &LicenseConfig, default_file: &Path) -> Option<SecretString> {
    if let Some(key) = &config.key {
        log::info!("license found in configuration");
        return Some(SecretString::new(key.expose_secret().clone()));
    }
    let path = config
        .key_file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_file.to_path_buf());
    match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.trim().is_empty() => {
            log::info!("license found in {}", path.display());
            Some(SecretString::new(contents.trim().to_string()))
        }
        Ok(_) => None,
        Err(e) => {
            log::debug!("no license file at {}: {e}", path.display());
            None
        }
    }
}

/// Refuses to start unless a valid key is present. A no-op when the guard is disabled.
pub async fn check(config: &LicenseConfig, default_file: &Path) -> Result<(), HunterError> {
    if !config.enabled {
        return Ok(());
    }
    let fingerprint = machine_fingerprint();
    let key = locate_key(config, default_file).ok_or_else(|| {
        HunterError::Guard(format!(
            "no license key found (machine fingerprint {fingerprint})"
        ))
    })?;
    let method = LicenseGuard::from_config(config)?
        .validate(key.expose_secret(), &fingerprint)
        .await?;
    log::info!("license validated ({method:?})");
    Ok(())
}
