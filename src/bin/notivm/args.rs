use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use notivm::config::LoggingConfig;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Mode {
    /// Restart exhausted runs until an instance is running
    #[default]
    Continuous,
    /// One launch attempt, non-zero exit on failure
    Single,
}

#[derive(Parser, Debug)]
#[command(
    name = "notivm",
    about = "Keeps launching a cloud instance until capacity frees up, reporting to Telegram"
)]
pub struct CliArgs {
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Dotenv file loaded before configuration (falls back to $ENV_FILE)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Mode::Continuous)]
    pub mode: Mode,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    /// Command-line logging flags win over the config file.
    pub fn apply_logging(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.to_lowercase();
        }
        if let Some(path) = &self.log_file {
            logging.path = Some(path.display().to_string());
        }
    }

    pub fn env_file(&self) -> Option<PathBuf> {
        self.env_file
            .clone()
            .or_else(|| std::env::var_os("ENV_FILE").map(PathBuf::from))
    }
}
