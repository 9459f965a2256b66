//! Audio extraction stage: download the audio track of a video URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vidsum_core::types::JobId;

use crate::command::run_tool;
use crate::error::StageError;

/// Downloads the audio of `url` into one media file named after the job.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, url: &str, job_id: JobId) -> Result<PathBuf, StageError>;
}

/// [`AudioExtractor`] backed by the `yt-dlp` downloader.
///
/// The best audio-only stream is saved as `<audio_dir>/<job_id>.<ext>`
/// without re-encoding; the extension is whatever the host serves.
pub struct YtDlpExtractor {
    bin: String,
    audio_dir: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(bin: impl Into<String>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            audio_dir: audio_dir.into(),
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    fn args(&self, url: &str, job_id: JobId) -> Vec<String> {
        let template = self.audio_dir.join(format!("{job_id}.%(ext)s"));
        vec![
            "--no-playlist".into(),
            "--no-progress".into(),
            "-f".into(),
            "bestaudio".into(),
            "-o".into(),
            template.to_string_lossy().into_owned(),
            "--print".into(),
            "after_move:filepath".into(),
            "--".into(),
            url.into(),
        ]
    }
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn extract(&self, url: &str, job_id: JobId) -> Result<PathBuf, StageError> {
        tracing::info!(%job_id, url, "Extracting audio");

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let stdout = run_tool(&self.bin, self.args(url, job_id)).await?;

        let path = downloaded_path(&stdout).ok_or(StageError::EmptyOutput)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(StageError::MissingInput(path));
        }

        tracing::info!(%job_id, path = %path.display(), "Audio extraction completed");
        Ok(path)
    }
}

/// The final file path `yt-dlp` printed, i.e. its last non-empty line.
fn downloaded_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_template_is_named_by_job_id() {
        let extractor = YtDlpExtractor::new("yt-dlp", "/data/audio");
        let id = JobId::new_v4();
        let args = extractor.args("https://youtu.be/dQw4w9WgXcQ", id);

        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], format!("/data/audio/{id}.%(ext)s"));
        assert_eq!(args.last().unwrap(), "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn downloaded_path_takes_last_line() {
        let out = "[info] something\n/data/audio/abc.webm\n\n";
        assert_eq!(
            downloaded_path(out),
            Some(PathBuf::from("/data/audio/abc.webm"))
        );
        assert_eq!(downloaded_path("  \n"), None);
    }
}
