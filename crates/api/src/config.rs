use std::path::PathBuf;
use std::time::Duration;

use vidsum_pipeline::PipelineConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running jobs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Session signing key. Loaded for parity with deployments; no handler
    /// signs anything yet.
    pub secret_key: String,
    /// One `<job_id>.json` record per job.
    pub jobs_dir: PathBuf,
    /// Optional directory with the browser frontend, served at `/`.
    pub static_dir: Option<PathBuf>,
    /// Maximum request body size in bytes.
    pub max_content_length: usize,
    /// How long finished jobs are meant to be kept. Cleanup runs outside
    /// this service.
    pub job_retention: Duration,
    /// Number of jobs processed concurrently.
    pub worker_count: usize,
    /// Jobs allowed to wait for a worker before submissions get `503`.
    pub queue_capacity: usize,
    /// Stage adapter settings (audio dir, model size, GPU toggle, ...).
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `SECRET_KEY`           | `dev-secret-key`           |
    /// | `INSTANCE_DIR`         | `instance`                 |
    /// | `JOBS_DIR`             | `<INSTANCE_DIR>/jobs`      |
    /// | `STATIC_DIR`           | unset                      |
    /// | `MAX_CONTENT_LENGTH`   | `10485760` (10 MiB)        |
    /// | `JOB_RETENTION_SECS`   | `86400` (24 h)             |
    /// | `WORKER_COUNT`         | `2`                        |
    /// | `QUEUE_CAPACITY`       | `64`                       |
    ///
    /// Stage settings are read by [`PipelineConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let secret_key =
            std::env::var("SECRET_KEY").unwrap_or_else(|_| "dev-secret-key".into());

        let instance_dir =
            PathBuf::from(std::env::var("INSTANCE_DIR").unwrap_or_else(|_| "instance".into()));
        let jobs_dir = std::env::var("JOBS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| instance_dir.join("jobs"));

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let max_content_length: usize = std::env::var("MAX_CONTENT_LENGTH")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_CONTENT_LENGTH must be a valid usize");

        let job_retention_secs: u64 = std::env::var("JOB_RETENTION_SECS")
            .unwrap_or_else(|_| (24 * 60 * 60).to_string())
            .parse()
            .expect("JOB_RETENTION_SECS must be a valid u64");

        let worker_count: usize = std::env::var("WORKER_COUNT")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("WORKER_COUNT must be a valid usize");

        let queue_capacity: usize = std::env::var("QUEUE_CAPACITY")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("QUEUE_CAPACITY must be a valid usize");

        let pipeline = PipelineConfig::from_env(&instance_dir);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            secret_key,
            jobs_dir,
            static_dir,
            max_content_length,
            job_retention: Duration::from_secs(job_retention_secs),
            worker_count,
            queue_capacity,
            pipeline,
        }
    }
}
