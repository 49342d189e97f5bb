mod app;
mod health;
mod instance;
mod license;
mod logging;
mod notification;
mod provider;
mod region;
mod retry;
mod runner;

const DEFAULT_REGION: &str = "ap-seoul-1";
const DEFAULT_MAX_ATTEMPTS: u32 = 1000;
const DEFAULT_INITIAL_WAIT_SECS: f64 = 30.0;
const DEFAULT_MAX_WAIT_SECS: f64 = 300.0;
const DEFAULT_MULTIPLIER: f64 = 1.5;
const DEFAULT_LIFECYCLE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_RESTART_DELAY_SECS: u64 = 300;
const DEFAULT_CRASH_DELAY_SECS: u64 = 60;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HEALTH_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 5;

pub use app::HunterConfig;
pub use health::HealthConfig;
pub use instance::InstanceConfig;
pub use license::LicenseConfig;
pub use logging::LoggingConfig;
pub use notification::NotificationConfig;
pub use provider::ProviderConfig;
pub use region::RegionProfile;
pub use retry::RetryConfig;
pub use runner::RunnerConfig;
