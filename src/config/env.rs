use std::str::FromStr;

use secrecy::SecretString;

use super::types::HunterConfig;

/// Applies overrides from the process environment.
pub fn apply_process_env(config: &mut HunterConfig) {
    apply_env_overrides(config, |key| std::env::var(key).ok());
}

/// Applies the recognised environment overrides using `lookup` as the source.
///
/// Empty values are ignored; numeric values that fail to parse are logged and skipped.
pub fn apply_env_overrides<F>(config: &mut HunterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(region) = get("OCI_REGION") {
        config.region = region;
    }
    if let Some(tenancy) = get("OCI_TENANCY_OCID") {
        config.provider.tenancy_id = Some(tenancy);
    }
    if let Some(user) = get("OCI_USER_OCID") {
        config.provider.user_id = Some(user);
    }
    if let Some(fingerprint) = get("OCI_FINGERPRINT") {
        config.provider.fingerprint = Some(fingerprint);
    }
    if let Some(path) = get("OCI_PRIVATE_KEY_PATH") {
        config.provider.private_key_path = Some(path);
    }
    if let Some(compartment) = get("VM_COMPARTMENT_OCID") {
        config.provider.compartment_id = Some(compartment);
    }
    if let Some(token) = get("OCI_AUTH_TOKEN") {
        config.provider.auth_token = Some(SecretString::new(token));
    }
    if let Some(endpoint) = get("OCI_COMPUTE_ENDPOINT") {
        config.provider.compute_endpoint = Some(endpoint);
    }
    if let Some(endpoint) = get("OCI_IDENTITY_ENDPOINT") {
        config.provider.identity_endpoint = Some(endpoint);
    }
    if let Some(shape) = get("VM_SHAPE") {
        config.instance.shape = shape;
    }
    if let Some(ocpus) = parse_number(&get, "VM_OCPUS") {
        config.instance.ocpus = ocpus;
    }
    if let Some(memory) = parse_number(&get, "VM_MEMORY_GB") {
        config.instance.memory_gb = memory;
    }
    if let Some(boot) = parse_number(&get, "VM_BOOT_VOLUME_SIZE_GB") {
        config.instance.boot_volume_gb = boot;
    }
    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.notification.bot_token = Some(SecretString::new(token));
    }
    if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
        config.notification.chat_id = Some(chat_id);
    }
    if let Some(key) = get("ORACLE_VM_HUNTER_LICENSE") {
        config.license.key = Some(SecretString::new(key));
    }
    if let Some(url) = get("LICENSE_SERVER_URL") {
        config.license.server_url = Some(url);
    }
}

fn parse_number<T, G>(get: &G, key: &str) -> Option<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {key}={raw}: not a valid number");
            None
        }
    }
}
