//! Route definitions for job submission and polling.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/api`.
///
/// ```text
/// POST   /summarize         -> submit_job
/// GET    /job/{job_id}      -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summarize", post(jobs::submit_job))
        .route("/job/{job_id}", get(jobs::get_job))
}
