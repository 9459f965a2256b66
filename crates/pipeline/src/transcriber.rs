//! Transcription stage: speech to text with whisper.cpp.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::command::run_tool;
use crate::error::StageError;

/// Turns an audio file into plain transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, StageError>;
}

// ---------------------------------------------------------------------------
// Model size
// ---------------------------------------------------------------------------

/// Whisper model variant, trading accuracy for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSize {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }

    /// ggml model file name as published for whisper.cpp.
    pub fn filename(self) -> String {
        match self {
            ModelSize::Large => "ggml-large-v3.bin".to_string(),
            other => format!("ggml-{}.bin", other.as_str()),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid WHISPER_MODEL_SIZE '{0}'. Must be one of: tiny, base, small, medium, large")]
pub struct ParseModelSizeError(String);

impl FromStr for ModelSize {
    type Err = ParseModelSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            _ => Err(ParseModelSizeError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// whisper.cpp adapter
// ---------------------------------------------------------------------------

/// A resolved, verified model file.
#[derive(Debug)]
struct LoadedModel {
    path: PathBuf,
}

/// [`Transcriber`] that shells out to the whisper.cpp CLI.
///
/// Input audio is first normalized to 16 kHz mono WAV with `ffmpeg`, the
/// only format every whisper.cpp build accepts.
///
/// The model is resolved once on first use and shared by every job that
/// goes through this instance. `OnceCell::get_or_try_init` serializes
/// concurrent first calls, so only one of them performs the lookup; a
/// failed lookup leaves the cell empty and the next job retries it.
pub struct WhisperCppTranscriber {
    bin: String,
    ffmpeg_bin: String,
    models_dir: PathBuf,
    size: ModelSize,
    use_gpu: bool,
    model: OnceCell<LoadedModel>,
}

impl WhisperCppTranscriber {
    pub fn new(
        bin: impl Into<String>,
        models_dir: impl Into<PathBuf>,
        size: ModelSize,
        use_gpu: bool,
    ) -> Self {
        Self {
            bin: bin.into(),
            ffmpeg_bin: "ffmpeg".into(),
            models_dir: models_dir.into(),
            size,
            use_gpu,
            model: OnceCell::new(),
        }
    }

    /// Override the `ffmpeg` binary used for audio normalization.
    pub fn with_ffmpeg(mut self, ffmpeg_bin: impl Into<String>) -> Self {
        self.ffmpeg_bin = ffmpeg_bin.into();
        self
    }

    async fn model(&self) -> Result<&LoadedModel, StageError> {
        self.model
            .get_or_try_init(|| async {
                let path = self.models_dir.join(self.size.filename());
                tracing::info!(
                    model = %self.size,
                    path = %path.display(),
                    use_gpu = self.use_gpu,
                    "Loading Whisper model (first use)",
                );
                if !tokio::fs::try_exists(&path).await? {
                    return Err(StageError::MissingInput(path));
                }
                Ok::<_, StageError>(LoadedModel { path })
            })
            .await
    }

    fn whisper_args(&self, model: &Path, wav: &Path) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            model.to_string_lossy().into_owned(),
            "--file".to_string(),
            wav.to_string_lossy().into_owned(),
            "--language".to_string(),
            "auto".to_string(),
            "--no-timestamps".to_string(),
        ];
        if !self.use_gpu {
            args.push("--no-gpu".to_string());
        }
        args
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, StageError> {
        tracing::info!(path = %audio_path.display(), "Transcribing audio");

        if !tokio::fs::try_exists(audio_path).await? {
            return Err(StageError::MissingInput(audio_path.to_path_buf()));
        }

        let model = self.model().await?;

        let scratch = tempfile::Builder::new().prefix("vidsum-").tempdir()?;
        let wav = scratch.path().join("audio.wav");
        let ffmpeg_args: [&OsStr; 11] = [
            OsStr::new("-nostdin"),
            OsStr::new("-y"),
            OsStr::new("-i"),
            audio_path.as_os_str(),
            OsStr::new("-ar"),
            OsStr::new("16000"),
            OsStr::new("-ac"),
            OsStr::new("1"),
            OsStr::new("-c:a"),
            OsStr::new("pcm_s16le"),
            wav.as_os_str(),
        ];
        run_tool(&self.ffmpeg_bin, ffmpeg_args).await?;

        let stdout = run_tool(&self.bin, self.whisper_args(&model.path, &wav)).await?;
        let transcript = join_lines(&stdout);
        if transcript.is_empty() {
            return Err(StageError::EmptyOutput);
        }

        tracing::info!(chars = transcript.len(), "Transcription completed");
        Ok(transcript)
    }
}

/// Collapse whisper's per-segment lines into one paragraph.
fn join_lines(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn model_size_parses_case_insensitively() {
        assert_eq!("Small".parse::<ModelSize>().unwrap(), ModelSize::Small);
        assert_eq!(" tiny ".parse::<ModelSize>().unwrap(), ModelSize::Tiny);
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn model_filenames() {
        assert_eq!(ModelSize::Base.filename(), "ggml-base.bin");
        assert_eq!(ModelSize::Large.filename(), "ggml-large-v3.bin");
    }

    #[test]
    fn gpu_toggle_controls_flag() {
        let on = WhisperCppTranscriber::new("w", "m", ModelSize::Base, true);
        let off = WhisperCppTranscriber::new("w", "m", ModelSize::Base, false);
        let (model, wav) = (Path::new("m.bin"), Path::new("a.wav"));

        assert!(!on.whisper_args(model, wav).contains(&"--no-gpu".to_string()));
        assert!(off.whisper_args(model, wav).contains(&"--no-gpu".to_string()));
    }

    #[test]
    fn joins_segment_lines() {
        assert_eq!(join_lines(" Hello there.\n\n General Kenobi. \n"), "Hello there. General Kenobi.");
    }

    #[tokio::test]
    async fn missing_audio_is_reported_before_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let t = WhisperCppTranscriber::new("w", dir.path(), ModelSize::Base, false);

        let result = t.transcribe(&dir.path().join("nope.m4a")).await;
        assert_matches!(result, Err(StageError::MissingInput(p)) if p.ends_with("nope.m4a"));
        assert!(t.model.get().is_none());
    }

    #[tokio::test]
    async fn missing_model_is_retried_on_next_use() {
        let dir = tempfile::tempdir().unwrap();
        let t = WhisperCppTranscriber::new("w", dir.path(), ModelSize::Tiny, false);

        assert_matches!(t.model().await, Err(StageError::MissingInput(_)));

        tokio::fs::write(dir.path().join("ggml-tiny.bin"), b"model")
            .await
            .unwrap();
        let loaded = t.model().await.unwrap();
        assert!(loaded.path.ends_with("ggml-tiny.bin"));
    }
}
