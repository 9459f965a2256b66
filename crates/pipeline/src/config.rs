use std::path::PathBuf;

use crate::transcriber::ModelSize;

/// Default inference endpoint for the abstractive summarizer.
pub const DEFAULT_SUMMARIZER_URL: &str =
    "https://api-inference.huggingface.co/models/paulowoicho/t5-podcast-summarisation";

/// Settings for the stage adapters, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where extracted media files are written, one per job.
    pub audio_dir: PathBuf,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
    pub whisper_models_dir: PathBuf,
    pub model_size: ModelSize,
    pub use_gpu: bool,
    pub summarizer_url: String,
    pub summarizer_token: Option<String>,
    pub sumy_bin: String,
    /// Upper bound on extracted bullet points.
    pub bullet_points: usize,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                   |
    /// |----------------------|---------------------------|
    /// | `AUDIO_DIR`          | `<instance_dir>/audio`    |
    /// | `YTDLP_BIN`          | `yt-dlp`                  |
    /// | `FFMPEG_BIN`         | `ffmpeg`                  |
    /// | `WHISPER_BIN`        | `whisper-cli`             |
    /// | `WHISPER_MODELS_DIR` | `models`                  |
    /// | `WHISPER_MODEL_SIZE` | `base`                    |
    /// | `USE_GPU`            | `true`                    |
    /// | `SUMMARIZER_URL`     | [`DEFAULT_SUMMARIZER_URL`]|
    /// | `SUMMARIZER_TOKEN`   | unset                     |
    /// | `SUMY_BIN`           | `sumy`                    |
    /// | `BULLET_POINTS`      | `10`                      |
    pub fn from_env(instance_dir: &std::path::Path) -> Self {
        let audio_dir = std::env::var("AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| instance_dir.join("audio"));

        let model_size: ModelSize = std::env::var("WHISPER_MODEL_SIZE")
            .unwrap_or_else(|_| "base".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let use_gpu = parse_flag(&std::env::var("USE_GPU").unwrap_or_else(|_| "true".into()));

        let bullet_points: usize = std::env::var("BULLET_POINTS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("BULLET_POINTS must be a valid usize");

        Self {
            audio_dir,
            ytdlp_bin: std::env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".into()),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".into()),
            whisper_bin: std::env::var("WHISPER_BIN").unwrap_or_else(|_| "whisper-cli".into()),
            whisper_models_dir: std::env::var("WHISPER_MODELS_DIR")
                .unwrap_or_else(|_| "models".into())
                .into(),
            model_size,
            use_gpu,
            summarizer_url: std::env::var("SUMMARIZER_URL")
                .unwrap_or_else(|_| DEFAULT_SUMMARIZER_URL.into()),
            summarizer_token: std::env::var("SUMMARIZER_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            sumy_bin: std::env::var("SUMY_BIN").unwrap_or_else(|_| "sumy".into()),
            bullet_points,
        }
    }
}

/// `true`, `1` and `t` (any case) are truthy; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "t")
}
