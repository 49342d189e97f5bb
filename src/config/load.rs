use std::fs;
use std::path::{Path, PathBuf};

use super::env::apply_process_env;
use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::types::HunterConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: HunterConfig,
    pub paths: ConfigPaths,
    pub config_exists: bool,
}

/// Reads the config file (defaults when absent) and applies environment overrides.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let paths = ConfigPaths::resolve(path_override)?;
    let (mut config, config_exists) = read_config(&paths.config_file)?;
    apply_process_env(&mut config);
    Ok(LoadedConfig {
        config,
        paths,
        config_exists,
    })
}

pub fn parse_config(contents: &str) -> Result<HunterConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}

fn read_config(path: &Path) -> Result<(HunterConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            log::info!("configuration loaded from {}", path.display());
            Ok((parse_config(&contents)?, true))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "configuration file {} not found, using defaults",
                path.display()
            );
            Ok((HunterConfig::default(), false))
        }
        Err(err) => Err(ConfigError::Io(err)),
    }
}
