//! Liveness endpoint for hosting platforms that probe the process over HTTP.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::HunterError;
use crate::orchestrator::{RunPhase, RunStatus};

pub const SERVICE_NAME: &str = "notivm";

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
    pub phase: RunPhase,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl HealthReport {
    fn from_status(status: &RunStatus) -> Self {
        Self {
            status: "healthy",
            service: SERVICE_NAME,
            timestamp: Utc::now(),
            phase: status.phase,
            attempt: status.attempt,
            max_attempts: status.max_attempts,
        }
    }
}

async fn health(State(status): State<watch::Receiver<RunStatus>>) -> Json<HealthReport> {
    let report = HealthReport::from_status(&status.borrow());
    Json(report)
}

/// `/health` only; everything else is a 404.
pub fn router(status: watch::Receiver<RunStatus>) -> Router {
    Router::new().route("/health", get(health)).with_state(status)
}

pub async fn bind(addr: &str) -> Result<TcpListener, HunterError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| HunterError::Generic(format!("cannot bind health endpoint to {addr}: {e}")))
}

/// Serves until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    status: watch::Receiver<RunStatus>,
    cancel: CancellationToken,
) -> Result<(), HunterError> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("health endpoint listening on http://{addr}/health");
    }
    axum::serve(listener, router(status))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| HunterError::Generic(format!("health endpoint failed: {e}")))
}
