//! Extractive highlights stage: pick the key sentences of a transcript.

use std::io::Write;

use async_trait::async_trait;

use crate::command::run_tool;
use crate::error::StageError;

/// Sentences this short are dropped from the highlights.
const MIN_POINT_CHARS: usize = 10;

/// Produces bullet-point highlights from a transcript.
#[async_trait]
pub trait BulletMaker: Send + Sync {
    async fn bullet_points(&self, transcript: &str) -> Result<Vec<String>, StageError>;
}

/// [`BulletMaker`] backed by the `sumy` CLI running TextRank.
pub struct SumyBulletMaker {
    bin: String,
    max_points: usize,
}

impl SumyBulletMaker {
    pub fn new(bin: impl Into<String>, max_points: usize) -> Self {
        Self {
            bin: bin.into(),
            max_points,
        }
    }
}

#[async_trait]
impl BulletMaker for SumyBulletMaker {
    async fn bullet_points(&self, transcript: &str) -> Result<Vec<String>, StageError> {
        tracing::info!("Generating bullet points");

        let mut input = tempfile::Builder::new()
            .prefix("vidsum-transcript-")
            .suffix(".txt")
            .tempfile()?;
        input.write_all(normalize_whitespace(transcript).as_bytes())?;
        input.flush()?;

        let args = [
            "text-rank".to_string(),
            format!("--length={}", self.max_points),
            "--language=english".to_string(),
            "--format=plaintext".to_string(),
            format!("--file={}", input.path().display()),
        ];
        let stdout = run_tool(&self.bin, args).await?;

        let points = meaningful_points(&stdout);
        tracing::info!(count = points.len(), "Generated bullet points");
        Ok(points)
    }
}

/// Collapse every run of whitespace into a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One point per output line, keeping only lines longer than
/// [`MIN_POINT_CHARS`].
fn meaningful_points(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| l.chars().count() > MIN_POINT_CHARS)
        .map(str::to_string)
        .collect()
}
