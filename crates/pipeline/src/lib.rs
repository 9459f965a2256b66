//! The four pipeline stages and their adapters.
//!
//! Each stage is a trait so the runner can be driven by fakes in tests. The
//! production adapters invoke external tools and services; none of the
//! speech or summarization work happens in-process.

pub mod bullets;
pub mod command;
pub mod config;
pub mod error;
pub mod extractor;
pub mod summarizer;
pub mod transcriber;

use std::sync::Arc;

pub use bullets::{BulletMaker, SumyBulletMaker};
pub use config::PipelineConfig;
pub use error::{Stage, StageError, StageFailure};
pub use extractor::{AudioExtractor, YtDlpExtractor};
pub use summarizer::{HttpSummarizer, Summarizer};
pub use transcriber::{ModelSize, Transcriber, WhisperCppTranscriber};

/// The set of stage implementations a runner drives.
///
/// Cheap to clone; every adapter is shared behind an `Arc` so model state
/// loaded by one job is reused by all others.
#[derive(Clone)]
pub struct Stages {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub bullet_maker: Arc<dyn BulletMaker>,
}

impl Stages {
    /// Build the production adapters from configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            extractor: Arc::new(YtDlpExtractor::new(
                config.ytdlp_bin.clone(),
                config.audio_dir.clone(),
            )),
            transcriber: Arc::new(WhisperCppTranscriber::new(
                config.whisper_bin.clone(),
                config.whisper_models_dir.clone(),
                config.model_size,
                config.use_gpu,
            )
            .with_ffmpeg(config.ffmpeg_bin.clone())),
            summarizer: Arc::new(HttpSummarizer::new(
                config.summarizer_url.clone(),
                config.summarizer_token.clone(),
            )),
            bullet_maker: Arc::new(SumyBulletMaker::new(
                config.sumy_bin.clone(),
                config.bullet_points,
            )),
        }
    }
}
