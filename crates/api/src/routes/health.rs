use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when jobs cannot be stored or run.
    pub status: &'static str,
    /// Server version.
    pub version: &'static str,
    /// Whether new job records can be written.
    pub store_healthy: bool,
    /// Jobs waiting for a worker.
    pub queued_jobs: usize,
}

/// GET /health -- returns service and job store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = state.store.is_healthy().await;

    let status = if store_healthy && !state.workers.is_shutdown() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        queued_jobs: state.workers.queued(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
