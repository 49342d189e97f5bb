use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use notivm::config::{load_config, HealthConfig};
use notivm::guard;
use notivm::notify::TelegramChannel;
use notivm::orchestrator::{Orchestrator, RunPhase, RunStatus};
use notivm::provider::{OciClient, OciSettings};

use crate::args::{CliArgs, Mode};
use crate::logging::init_logging;
use crate::signals::cancel_on_shutdown;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let env_file = args.env_file();
    let env_loaded = match &env_file {
        Some(path) => dotenvy::from_path(path).is_ok(),
        None => dotenvy::dotenv().is_ok(),
    };

    let mut loaded = load_config(args.config.clone())?;
    args.apply_logging(&mut loaded.config.logging);
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;
    match (&env_file, env_loaded) {
        (Some(path), true) => log::info!("environment loaded from {}", path.display()),
        (Some(path), false) => log::warn!(
            "environment file not found: {}, using system environment",
            path.display()
        ),
        _ => {}
    }
    if !loaded.config_exists {
        log::info!(
            "no config file at {}, using defaults and environment",
            loaded.paths.config_file.display()
        );
    }

    let config = loaded.config;
    config.validate().context("invalid configuration")?;
    guard::check(&config.license, &loaded.paths.license_file()).await?;

    let provider = Arc::new(OciClient::new(OciSettings::from_config(&config)?)?);
    let channel = Arc::new(TelegramChannel::from_config(&config.notification)?);
    let cancel = CancellationToken::new();
    let mut orchestrator =
        Orchestrator::from_config(&config, provider, channel)?.with_cancellation(cancel.clone());
    if args.mode == Mode::Single {
        orchestrator = orchestrator.with_max_attempts(1)?;
    }

    start_health(&config.health, orchestrator.status(), cancel.clone()).await;
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let instance = match args.mode {
        Mode::Continuous => {
            log::info!("starting continuous instance hunt");
            orchestrator.run_continuous().await
        }
        Mode::Single => {
            log::info!("launching a single instance");
            orchestrator.run_until_success_or_exhausted().await
        }
    };
    let cancelled = orchestrator.status().borrow().phase == RunPhase::Cancelled;
    cancel.cancel();

    match instance {
        Some(instance) => {
            log::info!(
                "instance {} ({}) is running",
                instance.display_name,
                instance.instance_id
            );
            Ok(())
        }
        None if cancelled => Ok(()),
        None if args.mode == Mode::Single => bail!("single instance launch failed"),
        None => Ok(()),
    }
}

#[cfg(feature = "health")]
async fn start_health(
    config: &HealthConfig,
    status: tokio::sync::watch::Receiver<RunStatus>,
    cancel: CancellationToken,
) {
    use notivm::health;

    if !config.enabled {
        return;
    }
    match health::bind(&config.bind).await {
        Ok(listener) => {
            tokio::spawn(async move {
                if let Err(e) = health::serve(listener, status, cancel).await {
                    log::warn!("{e}");
                }
            });
        }
        Err(e) => log::warn!("failed to start health endpoint: {e}"),
    }
}

#[cfg(not(feature = "health"))]
async fn start_health(
    _config: &HealthConfig,
    _status: tokio::sync::watch::Receiver<RunStatus>,
    _cancel: CancellationToken,
) {
}
