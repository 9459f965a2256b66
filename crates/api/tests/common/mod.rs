#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Notify;
use tower::ServiceExt;

use vidsum_api::config::ServerConfig;
use vidsum_api::router::build_app_router;
use vidsum_api::state::AppState;
use vidsum_core::job::{Job, JobStatus};
use vidsum_core::types::JobId;
use vidsum_db::{JobStore, MemoryJobStore};
use vidsum_pipeline::{
    AudioExtractor, BulletMaker, ModelSize, PipelineConfig, StageError, Stages, Summarizer,
    Transcriber,
};
use vidsum_worker::{JobRunner, WorkerPool};

pub const VALID_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:3000` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(workers: usize, queue: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        secret_key: "test-secret".to_string(),
        jobs_dir: PathBuf::from("unused-jobs"),
        static_dir: None,
        max_content_length: 1024,
        job_retention: Duration::from_secs(60),
        worker_count: workers,
        queue_capacity: queue,
        pipeline: PipelineConfig {
            audio_dir: PathBuf::from("unused-audio"),
            ytdlp_bin: "yt-dlp".into(),
            ffmpeg_bin: "ffmpeg".into(),
            whisper_bin: "whisper-cli".into(),
            whisper_models_dir: PathBuf::from("models"),
            model_size: ModelSize::Tiny,
            use_gpu: false,
            summarizer_url: "http://127.0.0.1:9".into(),
            summarizer_token: None,
            sumy_bin: "sumy".into(),
            bullet_points: 10,
        },
    }
}

// ---------------------------------------------------------------------------
// Fake stages
// ---------------------------------------------------------------------------

/// Extraction that optionally waits for a permit, so tests can hold jobs
/// in `extracting_audio`.
pub struct FakeExtractor {
    pub gate: Option<Arc<Notify>>,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, url: &str, job_id: JobId) -> Result<PathBuf, StageError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if url.contains("unavailable") {
            return Err(StageError::ToolFailed {
                tool: "yt-dlp".into(),
                exit_code: Some(1),
                stderr: "ERROR: Video unavailable".into(),
            });
        }
        Ok(PathBuf::from(format!("/audio/{job_id}.m4a")))
    }
}

pub struct FakeModels;

#[async_trait]
impl Transcriber for FakeModels {
    async fn transcribe(&self, _audio: &Path) -> Result<String, StageError> {
        Ok("Welcome to the show. Today we talk about Rust. Ownership keeps memory safe.".into())
    }
}

#[async_trait]
impl Summarizer for FakeModels {
    async fn summarize(&self, _transcript: &str) -> Result<String, StageError> {
        Ok("An episode about Rust and memory safety.".into())
    }
}

#[async_trait]
impl BulletMaker for FakeModels {
    async fn bullet_points(&self, _transcript: &str) -> Result<Vec<String>, StageError> {
        Ok(vec![
            "Today we talk about Rust.".into(),
            "Ownership keeps memory safe.".into(),
        ])
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryJobStore>,
    pub workers: Arc<WorkerPool>,
}

/// Build the full application router with fake stages and an in-memory
/// store, using the same middleware stack as production.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config(2, 16), None)
}

/// Like [`build_test_app`], with a custom config and an optional gate that
/// blocks extraction until notified.
pub fn build_test_app_with(config: ServerConfig, gate: Option<Arc<Notify>>) -> TestApp {
    let store = Arc::new(MemoryJobStore::new());
    let stages = Stages {
        extractor: Arc::new(FakeExtractor { gate }),
        transcriber: Arc::new(FakeModels),
        summarizer: Arc::new(FakeModels),
        bullet_maker: Arc::new(FakeModels),
    };
    let runner = Arc::new(JobRunner::new(store.clone(), stages));
    let workers = Arc::new(WorkerPool::start(
        runner,
        config.worker_count,
        config.queue_capacity,
    ));

    let state = AppState {
        store: store.clone(),
        workers: Arc::clone(&workers),
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        workers,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, "application/json", body.to_string()).await
}

pub async fn post_raw(
    app: &TestApp,
    uri: &str,
    content_type: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit `url` and return the new job id, asserting acceptance.
pub async fn submit(app: &TestApp, url: &str) -> JobId {
    let response = post_json(app, "/api/summarize", serde_json::json!({ "url": url })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["job_id"].as_str().unwrap().parse().unwrap()
}

/// Poll the store until the job reaches `status`, or panic after ~2 seconds.
pub async fn wait_for_status(app: &TestApp, id: JobId, status: JobStatus) -> Job {
    for _ in 0..200 {
        if let Some(job) = app.store.load(id).await.unwrap() {
            if job.status == status {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached {status}");
}
