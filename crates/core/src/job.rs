//! The persisted job record and its forward-only status state machine.
//!
//! ```text
//! queued -> extracting_audio -> transcribing -> summarizing -> completed
//!    (any non-terminal state) -> error
//! ```
//!
//! A record is only ever mutated by the runner that owns the job, so the
//! helpers here enforce the invariants locally instead of relying on the
//! store: statuses never move backward, stage outputs are written once, and
//! `error` / `completed_at` are mutually exclusive.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Message recorded when a stage fails without a usable description.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    ExtractingAudio,
    Transcribing,
    Summarizing,
    Completed,
    Error,
}

impl JobStatus {
    /// All statuses in pipeline order, `error` last.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Queued,
        JobStatus::ExtractingAudio,
        JobStatus::Transcribing,
        JobStatus::Summarizing,
        JobStatus::Completed,
        JobStatus::Error,
    ];

    /// Position along the forward pipeline order. `error` is off the line.
    pub fn rank(self) -> Option<u8> {
        match self {
            JobStatus::Queued => Some(0),
            JobStatus::ExtractingAudio => Some(1),
            JobStatus::Transcribing => Some(2),
            JobStatus::Summarizing => Some(3),
            JobStatus::Completed => Some(4),
            JobStatus::Error => None,
        }
    }

    /// The status that follows this one on success, if any.
    pub fn next(self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::ExtractingAudio),
            JobStatus::ExtractingAudio => Some(JobStatus::Transcribing),
            JobStatus::Transcribing => Some(JobStatus::Summarizing),
            JobStatus::Summarizing => Some(JobStatus::Completed),
            JobStatus::Completed | JobStatus::Error => None,
        }
    }

    /// `completed` and `error` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether `self -> next` is a legal move: one step forward, or a jump
    /// to `error` from any non-terminal state.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Error || self.next() == Some(next)
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::ExtractingAudio => "extracting_audio",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Summarizing => "summarizing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One end-to-end request to turn a video URL into a summary.
///
/// Optional fields are left out of the JSON entirely until they are set, so
/// a freshly queued job serializes as `{id, status, url, created_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub url: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_points: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a `queued` job with a fresh random id.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_id(JobId::new_v4(), url)
    }

    /// Create a `queued` job under a caller-chosen id.
    pub fn with_id(id: JobId, url: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            url: url.into(),
            created_at: chrono::Utc::now(),
            completed_at: None,
            audio_path: None,
            transcript: None,
            paragraph_summary: None,
            bullet_points: None,
            error: None,
        }
    }

    /// Move to `next`, rejecting anything but a single forward step or a
    /// jump to `error`. Reaching `completed` stamps `completed_at`.
    pub fn advance(&mut self, next: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == JobStatus::Completed {
            let missing = self
                .paragraph_summary
                .as_deref()
                .map_or(true, str::is_empty)
                || self.bullet_points.as_ref().map_or(true, Vec::is_empty);
            if missing {
                return Err(CoreError::Validation(
                    "Cannot complete a job without a summary and bullet points".into(),
                ));
            }
            self.completed_at = Some(chrono::Utc::now());
        }
        self.status = next;
        Ok(())
    }

    /// Terminally fail the job with `message`.
    ///
    /// Fails with [`CoreError::InvalidTransition`] if the job already
    /// reached a terminal state.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        self.advance(JobStatus::Error)?;
        let message = message.into();
        self.error = Some(if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        });
        Ok(())
    }

    pub fn record_audio(&mut self, path: PathBuf) -> Result<(), CoreError> {
        write_once(&mut self.audio_path, path, "audio_path")
    }

    pub fn record_transcript(&mut self, transcript: String) -> Result<(), CoreError> {
        write_once(&mut self.transcript, transcript, "transcript")
    }

    pub fn record_summary(&mut self, summary: String) -> Result<(), CoreError> {
        write_once(&mut self.paragraph_summary, summary, "paragraph_summary")
    }

    pub fn record_bullet_points(&mut self, points: Vec<String>) -> Result<(), CoreError> {
        write_once(&mut self.bullet_points, points, "bullet_points")
    }
}

fn write_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), CoreError> {
    if slot.is_some() {
        return Err(CoreError::Conflict(format!("{field} is already set")));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn summarized_job() -> Job {
        let mut job = Job::new("https://youtu.be/dQw4w9WgXcQ");
        job.advance(JobStatus::ExtractingAudio).unwrap();
        job.advance(JobStatus::Transcribing).unwrap();
        job.advance(JobStatus::Summarizing).unwrap();
        job.record_summary("A summary.".into()).unwrap();
        job.record_bullet_points(vec!["A key point here.".into()])
            .unwrap();
        job
    }

    #[test]
    fn new_job_is_queued_without_outputs() {
        let job = Job::new("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.completed_at.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn forward_steps_are_the_only_success_transitions() {
        for from in JobStatus::ALL {
            for to in JobStatus::ALL {
                let allowed = from.can_transition_to(to);
                let expected = !from.is_terminal()
                    && (to == JobStatus::Error
                        || to.rank() == from.rank().map(|r| r + 1));
                assert_eq!(allowed, expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let mut job = Job::new("u");
        assert_matches!(
            job.advance(JobStatus::Transcribing),
            Err(CoreError::InvalidTransition {
                from: JobStatus::Queued,
                to: JobStatus::Transcribing
            })
        );
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[test]
    fn completing_sets_completed_at() {
        let mut job = summarized_job();
        job.advance(JobStatus::Completed).unwrap();
        assert!(job.completed_at.is_some());
        assert!(job.status.is_terminal());
    }

    #[test]
    fn completing_without_bullets_is_rejected() {
        let mut job = Job::new("u");
        job.advance(JobStatus::ExtractingAudio).unwrap();
        job.advance(JobStatus::Transcribing).unwrap();
        job.advance(JobStatus::Summarizing).unwrap();
        job.record_summary("summary".into()).unwrap();
        job.record_bullet_points(Vec::new()).unwrap();
        assert_matches!(
            job.advance(JobStatus::Completed),
            Err(CoreError::Validation(_))
        );
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn fail_from_any_non_terminal_state() {
        let mut job = Job::new("u");
        job.advance(JobStatus::ExtractingAudio).unwrap();
        job.fail("Failed to extract audio: boom").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("Failed to extract audio: boom"));
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn fail_never_stores_a_blank_message() {
        let mut job = Job::new("u");
        job.fail("  ").unwrap();
        assert_eq!(job.error.as_deref(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn terminal_jobs_cannot_fail() {
        let mut job = summarized_job();
        job.advance(JobStatus::Completed).unwrap();
        assert!(job.fail("late").is_err());
        assert!(job.error.is_none());
    }

    #[test]
    fn stage_outputs_are_written_once() {
        let mut job = Job::new("u");
        job.record_transcript("first".into()).unwrap();
        assert_matches!(
            job.record_transcript("second".into()),
            Err(CoreError::Conflict(_))
        );
        assert_eq!(job.transcript.as_deref(), Some("first"));
    }

    #[test]
    fn queued_record_serializes_without_optional_fields() {
        let job = Job::new("https://youtu.be/dQw4w9WgXcQ");
        let value = serde_json::to_value(&job).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["created_at", "id", "status", "url"]);
        assert_eq!(obj["status"], "queued");
    }

    #[test]
    fn status_wire_names_match_display() {
        for status in JobStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
            assert_eq!(status.to_string(), status.as_str());
        }
    }
}
