use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidsum_api::config::ServerConfig;
use vidsum_api::router::build_app_router;
use vidsum_api::state::AppState;
use vidsum_db::FileJobStore;
use vidsum_pipeline::Stages;
use vidsum_worker::{JobRunner, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vidsum_api=debug,vidsum_worker=debug,vidsum_pipeline=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        jobs_dir = %config.jobs_dir.display(),
        audio_dir = %config.pipeline.audio_dir.display(),
        model_size = %config.pipeline.model_size,
        use_gpu = config.pipeline.use_gpu,
        job_retention_secs = config.job_retention.as_secs(),
        "Loaded server configuration",
    );

    // --- Storage ---
    let store = FileJobStore::new(&config.jobs_dir);
    store
        .ensure_dirs()
        .await
        .context("Failed to create jobs directory")?;
    tokio::fs::create_dir_all(&config.pipeline.audio_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create audio directory {}",
                config.pipeline.audio_dir.display()
            )
        })?;
    let store = Arc::new(store);

    // --- Workers ---
    let stages = Stages::from_config(&config.pipeline);
    let runner = Arc::new(JobRunner::new(store.clone(), stages));
    let workers = Arc::new(WorkerPool::start(
        runner,
        config.worker_count,
        config.queue_capacity,
    ));

    // --- App state ---
    let state = AppState {
        store,
        workers: Arc::clone(&workers),
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining workers");
    workers
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!(signal = "SIGINT", "Shutdown requested");
        }
        () = terminate => {
            tracing::info!(signal = "SIGTERM", "Shutdown requested");
        }
    }
}
