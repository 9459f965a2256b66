//! Recognition of supported video-host URLs.
//!
//! Only the URL shape is checked here. Whether the video actually exists
//! is discovered later by the extraction stage and surfaces as a job error.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Message returned to clients for a URL that does not match.
pub const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL";

/// Anchored at the start only, so trailing query parameters are accepted.
static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
    )
    .expect("YouTube URL pattern is valid")
});

/// Whether `url` looks like a YouTube watch, embed or short link.
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Validate `url`, returning [`CoreError::Validation`] with the client-facing
/// message when it is not recognized.
pub fn validate_youtube_url(url: &str) -> Result<(), CoreError> {
    if is_valid_youtube_url(url) {
        Ok(())
    } else {
        Err(CoreError::Validation(INVALID_URL_MESSAGE.into()))
    }
}

/// The 11-character video id captured from a recognized URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_URL
        .captures(url)
        .and_then(|caps| caps.get(6))
        .map(|m| m.as_str().to_string())
}
