//! Abstractive summarization stage.
//!
//! Wraps a hosted text-to-text model (Hugging Face inference API shape)
//! using [`reqwest`]. Long transcripts are summarized chunk by chunk and the
//! joined chunk summaries are summarized once more for coherence.

use std::sync::{LazyLock, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Transcripts longer than this many characters are chunked.
pub const CHUNK_THRESHOLD: usize = 1000;

/// Default bounds on the generated summary, in model tokens.
pub const DEFAULT_MAX_LENGTH: u32 = 250;
pub const DEFAULT_MIN_LENGTH: u32 = 50;

/// Produces a single paragraph summarizing a transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String, StageError>;
}

/// Process-wide HTTP client, built on first use and shared by every
/// summarizer instance for connection pooling.
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: GenerationParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: u32,
    min_length: u32,
    length_penalty: f32,
    num_beams: u32,
    early_stopping: bool,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// One generated sequence. Summarization pipelines answer with
/// `summary_text`, generic text2text pipelines with `generated_text`.
#[derive(Debug, Deserialize)]
struct Generated {
    #[serde(alias = "generated_text")]
    summary_text: String,
}

// ---------------------------------------------------------------------------
// HTTP adapter
// ---------------------------------------------------------------------------

/// [`Summarizer`] calling a hosted T5-style summarization model.
pub struct HttpSummarizer {
    api_url: String,
    token: Option<String>,
    max_length: u32,
    min_length: u32,
}

impl HttpSummarizer {
    /// * `api_url` - Full inference URL of the model.
    /// * `token` - Optional bearer token.
    pub fn new(api_url: String, token: Option<String>) -> Self {
        Self {
            api_url,
            token,
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_lengths(mut self, max_length: u32, min_length: u32) -> Self {
        self.max_length = max_length;
        self.min_length = min_length;
        self
    }

    async fn generate(&self, text: &str, max_length: u32, min_length: u32) -> Result<String, StageError> {
        let body = InferenceRequest {
            inputs: format!("summarize: {text}"),
            parameters: GenerationParameters {
                max_length: max_length.max(1),
                min_length: min_length.min(max_length),
                length_penalty: 2.0,
                num_beams: 4,
                early_stopping: true,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = http_client().post(&self.api_url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let generated: Vec<Generated> = response.json().await?;
        generated
            .into_iter()
            .next()
            .map(|g| g.summary_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(StageError::EmptyOutput)
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, StageError> {
        tracing::info!(chars = transcript.len(), "Generating summary");

        let summary = if transcript.chars().count() > CHUNK_THRESHOLD {
            let chunks = chunk_text(transcript, CHUNK_THRESHOLD);
            let n = u32::try_from(chunks.len()).unwrap_or(u32::MAX).max(1);
            tracing::info!(chunks = chunks.len(), "Transcript is long, summarizing in chunks");

            let mut partials = Vec::with_capacity(chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                tracing::debug!(chunk = i + 1, of = chunks.len(), "Summarizing chunk");
                partials.push(
                    self.generate(chunk, self.max_length / n, self.min_length / n)
                        .await?,
                );
            }

            self.generate(&partials.join(" "), self.max_length, self.min_length)
                .await?
        } else {
            self.generate(transcript, self.max_length, self.min_length)
                .await?
        };

        tracing::info!(chars = summary.len(), "Summary generated");
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// Split `text` after sentence-ending punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // Keep the punctuation mark, drop the whitespace.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Greedily pack whole sentences into chunks of at most `max_chunk` chars.
///
/// A single sentence longer than `max_chunk` becomes its own chunk.
pub fn chunk_text(text: &str, max_chunk: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if !current.is_empty() && current.chars().count() + 1 + sentence.chars().count() > max_chunk {
            chunks.push(current.trim().to_string());
            current = sentence.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}
