use std::fmt;
use std::path::PathBuf;

/// The pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractAudio,
    Transcribe,
    Summarize,
    BulletPoints,
}

impl Stage {
    fn action(self) -> &'static str {
        match self {
            Stage::ExtractAudio => "extract audio",
            Stage::Transcribe => "transcribe audio",
            Stage::Summarize => "generate summary",
            Stage::BulletPoints => "generate bullet points",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Errors raised by a stage adapter.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{tool} not found: {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed (exit code {exit_code:?}): {stderr}")]
    ToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("empty output")]
    EmptyOutput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stage panicked: {0}")]
    Panicked(String),
}

/// A [`StageError`] tagged with the stage it came from.
///
/// Its `Display` form is what gets stored in a failed job's `error` field,
/// e.g. `Failed to transcribe audio: input file not found: /tmp/x.m4a`.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {stage}: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl StageFailure {
    pub fn new(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }
}

/// Attach a [`Stage`] to a stage result.
pub trait StageResultExt<T> {
    fn in_stage(self, stage: Stage) -> Result<T, StageFailure>;
}

impl<T> StageResultExt<T> for Result<T, StageError> {
    fn in_stage(self, stage: Stage) -> Result<T, StageFailure> {
        self.map_err(|source| StageFailure::new(stage, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_the_stage() {
        let failure = StageFailure::new(
            Stage::Transcribe,
            StageError::MissingInput(PathBuf::from("/tmp/abc.m4a")),
        );
        assert_eq!(
            failure.to_string(),
            "Failed to transcribe audio: input file not found: /tmp/abc.m4a"
        );
    }

    #[test]
    fn tool_failure_includes_exit_code_and_stderr() {
        let err: Result<(), _> = Err(StageError::ToolFailed {
            tool: "yt-dlp".into(),
            exit_code: Some(1),
            stderr: "ERROR: Video unavailable".into(),
        });
        let failure = err.in_stage(Stage::ExtractAudio).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "Failed to extract audio: yt-dlp failed (exit code Some(1)): ERROR: Video unavailable"
        );
    }
}
