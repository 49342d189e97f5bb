//! Startup configuration: a TOML file, an optional dotenv file and a fixed set
//! of environment overrides, resolved once into [`HunterConfig`].

mod env;
mod error;
mod load;
mod paths;
mod types;

pub use env::{apply_env_overrides, apply_process_env};
pub use error::ConfigError;
pub use load::{load_config, parse_config, LoadedConfig};
pub use paths::ConfigPaths;
pub use types::{
    HealthConfig, HunterConfig, InstanceConfig, LicenseConfig, LoggingConfig,
    NotificationConfig, ProviderConfig, RegionProfile, RetryConfig, RunnerConfig,
};
