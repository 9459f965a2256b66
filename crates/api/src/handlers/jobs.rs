//! Handlers for job submission and status polling.
//!
//! Submission only validates, records and enqueues; all pipeline work runs
//! on the worker pool and is observed by polling.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vidsum_core::error::CoreError;
use vidsum_core::job::{Job, JobStatus};
use vidsum_core::types::JobId;
use vidsum_core::youtube::validate_youtube_url;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Message for a body without a usable `url`.
pub const URL_REQUIRED_MESSAGE: &str = "URL is required";

/// Request body for `POST /api/summarize`.
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub url: Option<String>,
}

/// Response body for an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/summarize
///
/// Validate the URL, persist a `queued` job and hand it to the worker pool.
/// Returns immediately with the job id; nothing waits for the pipeline.
///
/// A body that is not JSON, or has no string `url`, is rejected with
/// `URL is required` before any job is created. Bodies over the configured
/// limit get `413`.
pub async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> AppResult<Json<SubmitJobResponse>> {
    let url = match payload {
        Ok(Json(body)) => body.url,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(AppError::PayloadTooLarge);
        }
        Err(_) => None,
    }
    .ok_or_else(|| AppError::BadRequest(URL_REQUIRED_MESSAGE.into()))?;

    validate_youtube_url(&url)?;

    let mut job = Job::new(url);
    state.store.save(&job).await?;

    if let Err(e) = state.workers.submit(job.id, job.url.clone()) {
        tracing::warn!(job_id = %job.id, error = %e, "Job rejected by worker pool");
        // The pool never saw this job, so the handler is still its only writer.
        job.fail(e.to_string())?;
        if let Err(store_err) = state.store.save(&job).await {
            tracing::error!(job_id = %job.id, error = %store_err, "Failed to record rejected job");
        }
        return Err(e.into());
    }

    tracing::info!(job_id = %job.id, url = %job.url, "Job submitted");

    Ok(Json(SubmitJobResponse {
        job_id: job.id,
        status: job.status,
    }))
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

/// GET /api/job/{job_id}
///
/// Return the full current job record. Ids that are not UUIDs can never
/// name a job and get the same 404 as unknown ones.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<Job>> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id.clone(),
        })
    };

    let id: JobId = job_id.parse().map_err(|_| not_found())?;
    let job = state.store.load(id).await?.ok_or_else(not_found)?;

    Ok(Json(job))
}
