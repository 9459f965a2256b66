//! Drives a single job through the pipeline stages.
//!
//! ```text
//! queued -> extracting_audio -> transcribing -> summarizing -> completed
//!    (any state) -> error
//! ```
//!
//! Every transition and every stage output is persisted before the next
//! stage starts, so after a crash the stored status names the last step that
//! finished. Nothing resumes automatically.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use vidsum_core::error::CoreError;
use vidsum_core::job::{Job, JobStatus};
use vidsum_core::types::JobId;
use vidsum_core::youtube::extract_video_id;
use vidsum_db::{JobStore, StoreError};
use vidsum_pipeline::error::StageResultExt;
use vidsum_pipeline::{Stage, StageError, StageFailure, Stages};

/// Why a run stopped short of `completed`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Stage(#[from] StageFailure),

    #[error("Failed to persist job: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    State(#[from] CoreError),
}

/// Executes jobs against a store and a set of stage adapters.
///
/// A runner holds no per-job state; the pool shares one instance across all
/// workers.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    stages: Stages,
}

impl JobRunner {
    pub fn new(store: Arc<dyn JobStore>, stages: Stages) -> Self {
        Self { store, stages }
    }

    /// Run the job to a terminal state and return that state.
    ///
    /// Stage failures, stage panics and storage failures never escape: they
    /// are recorded on the job as `error`. Returns the last status that was set in memory; if even
    /// the failure could not be persisted the stored record keeps its
    /// previous status.
    pub async fn run(&self, job_id: JobId, url: &str) -> JobStatus {
        let mut job = match self.store.load(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(%job_id, "Job record missing at start, recreating it");
                Job::with_id(job_id, url)
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "Failed to load job record");
                let mut job = Job::with_id(job_id, url);
                self.record_failure(&mut job, RunError::Store(e)).await;
                return job.status;
            }
        };

        if job.status != JobStatus::Queued {
            tracing::warn!(
                %job_id,
                status = %job.status,
                "Job is not queued, refusing to run it again",
            );
            return job.status;
        }

        tracing::info!(
            %job_id,
            video_id = extract_video_id(&job.url).as_deref().unwrap_or("unknown"),
            "Processing job",
        );

        let outcome = AssertUnwindSafe(self.drive(&mut job)).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => {
                tracing::info!(%job_id, "Job completed");
            }
            Ok(Err(e)) => self.record_failure(&mut job, e).await,
            Err(panic) => {
                let error = panic_error(&job, &*panic);
                self.record_failure(&mut job, error).await;
            }
        }
        job.status
    }

    async fn drive(&self, job: &mut Job) -> Result<(), RunError> {
        self.commit(job, JobStatus::ExtractingAudio).await?;
        let audio = self
            .stages
            .extractor
            .extract(&job.url, job.id)
            .await
            .in_stage(Stage::ExtractAudio)?;
        job.record_audio(audio)?;

        self.commit(job, JobStatus::Transcribing).await?;
        let audio_path = job.audio_path.clone().unwrap_or_default();
        let transcript = self
            .stages
            .transcriber
            .transcribe(&audio_path)
            .await
            .and_then(non_empty)
            .in_stage(Stage::Transcribe)?;
        job.record_transcript(transcript)?;

        self.commit(job, JobStatus::Summarizing).await?;
        let transcript = job.transcript.clone().unwrap_or_default();

        let summary = self
            .stages
            .summarizer
            .summarize(&transcript)
            .await
            .and_then(non_empty)
            .in_stage(Stage::Summarize)?;
        job.record_summary(summary)?;
        self.store.save(job).await?;

        let points = self
            .stages
            .bullet_maker
            .bullet_points(&transcript)
            .await
            .and_then(|points| {
                if points.is_empty() {
                    Err(StageError::EmptyOutput)
                } else {
                    Ok(points)
                }
            })
            .in_stage(Stage::BulletPoints)?;
        job.record_bullet_points(points)?;

        self.commit(job, JobStatus::Completed).await
    }

    /// Apply `next` and persist the whole record.
    ///
    /// If the write fails the in-memory status is rolled back, so the
    /// record can still move to `error` afterwards.
    async fn commit(&self, job: &mut Job, next: JobStatus) -> Result<(), RunError> {
        let previous = job.status;
        let previous_completed_at = job.completed_at;
        job.advance(next)?;

        if let Err(e) = self.store.save(job).await {
            job.status = previous;
            job.completed_at = previous_completed_at;
            return Err(e.into());
        }

        tracing::info!(job_id = %job.id, status = %job.status, "Job status updated");
        Ok(())
    }

    /// Move the job to `error` with the failure's message and persist it.
    ///
    /// Uses the runner's own copy of the record rather than re-reading the
    /// store: this runner is the only writer, so its copy already holds every
    /// field written so far.
    async fn record_failure(&self, job: &mut Job, error: RunError) {
        let message = error.to_string();
        tracing::error!(job_id = %job.id, status = %job.status, error = %message, "Job failed");

        if let Err(e) = job.fail(message) {
            tracing::error!(job_id = %job.id, error = %e, "Cannot mark job as failed");
            return;
        }
        if let Err(e) = self.store.save(job).await {
            tracing::error!(
                job_id = %job.id,
                error = %e,
                "Failed to persist job failure; record keeps its last saved status",
            );
        }
    }
}

/// Attribute a panic to the stage the job was in when it happened.
fn panic_error(job: &Job, payload: &(dyn Any + Send)) -> RunError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    let stage = match job.status {
        JobStatus::ExtractingAudio => Stage::ExtractAudio,
        JobStatus::Transcribing => Stage::Transcribe,
        JobStatus::Summarizing if job.paragraph_summary.is_some() => Stage::BulletPoints,
        JobStatus::Summarizing => Stage::Summarize,
        _ => {
            return RunError::State(CoreError::Internal(format!("Job panicked: {message}")));
        }
    };
    StageFailure::new(stage, StageError::Panicked(message)).into()
}

fn non_empty(text: String) -> Result<String, StageError> {
    if text.trim().is_empty() {
        Err(StageError::EmptyOutput)
    } else {
        Ok(text)
    }
}
