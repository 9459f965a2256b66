use std::sync::Arc;

use vidsum_db::JobStore;
use vidsum_worker::WorkerPool;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Durable job records.
    pub store: Arc<dyn JobStore>,
    /// Background workers that run submitted jobs.
    pub workers: Arc<WorkerPool>,
    pub config: Arc<ServerConfig>,
}
