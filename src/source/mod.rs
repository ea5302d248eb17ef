//! YouTube video sources.
//!
//! URL validation, storage keys, and metadata lookup for videos.

mod youtube;

pub use youtube::YoutubeSource;

use crate::error::{AssistantError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Hosts accepted as YouTube video URLs.
const YOUTUBE_HOSTS: &[&str] = &["www.youtube.com", "youtube.com", "m.youtube.com", "youtu.be"];

/// Metadata about a YouTube video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Storage key for this video.
    pub key: String,
    /// Title.
    pub title: String,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<f64>,
    /// Channel or uploader name.
    pub channel: Option<String>,
    /// Upload date.
    pub published_at: Option<DateTime<Utc>>,
    /// Canonical URL.
    pub url: String,
}

impl VideoMetadata {
    /// Metadata for a video whose details could not be fetched.
    pub fn placeholder(url: &str) -> Self {
        Self {
            key: video_key(url),
            title: url.to_string(),
            duration_seconds: None,
            channel: None,
            published_at: None,
            url: url.to_string(),
        }
    }
}

/// Validate that the input is an https YouTube URL.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| AssistantError::InvalidUrl(format!("{} ({})", trimmed, e)))?;

    if url.scheme() != "https" {
        return Err(AssistantError::InvalidUrl(format!(
            "{} (only https YouTube links are supported)",
            trimmed
        )));
    }

    match url.host_str() {
        Some(host) if YOUTUBE_HOSTS.contains(&host) => Ok(url),
        _ => Err(AssistantError::InvalidUrl(format!(
            "{} (expected a youtube.com or youtu.be link)",
            trimmed
        ))),
    }
}

/// Stable storage key for a video.
///
/// The 11-character video id when it can be extracted, otherwise a hash of the URL.
pub fn video_key(input: &str) -> String {
    YoutubeSource::new()
        .extract_video_id(input)
        .unwrap_or_else(|| format!("url_{}", url_digest(input)))
}

/// First 16 hex characters of the BLAKE3 hash of a trimmed URL.
fn url_digest(input: &str) -> String {
    let hash = blake3::hash(input.trim().as_bytes());
    hash.to_hex()[..16].to_string()
}
