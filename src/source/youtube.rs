//! YouTube metadata lookup through yt-dlp.

use super::VideoMetadata;
use crate::error::{AssistantError, Result};
use regex::Regex;
use tracing::{debug, instrument};

/// YouTube video source.
pub struct YoutubeSource {
    video_id_regex: Regex,
    ytdlp_path: String,
}

impl YoutubeSource {
    pub fn new() -> Self {
        Self::with_ytdlp("yt-dlp")
    }

    pub fn with_ytdlp(ytdlp_path: &str) -> Self {
        // Matches watch, short-link, embed and shorts URL formats
        let video_id_regex = Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.|m\.)?
            (?:
                youtube\.com/watch\?(?:[^\#\s]*&)?v=
                | youtu\.be/
                | youtube\.com/embed/
                | youtube\.com/v/
                | youtube\.com/shorts/
            )
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            ytdlp_path: ytdlp_path.to_string(),
        }
    }

    /// Extract the 11-character video ID from a YouTube URL.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        self.video_id_regex
            .captures(input.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch video metadata using yt-dlp.
    #[instrument(skip(self))]
    pub async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--no-playlist",
                url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AssistantError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    AssistantError::ToolFailed(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistantError::AudioDownload(format!(
                "Video {} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        debug!("Fetched metadata for {}", url);

        Ok(self.parse_metadata(url, &json))
    }

    /// Build metadata from a yt-dlp JSON document.
    fn parse_metadata(&self, url: &str, json: &serde_json::Value) -> VideoMetadata {
        let title = json["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let channel = json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .map(|s| s.to_string());

        // yt-dlp returns the upload date as YYYYMMDD
        let published_at = json["upload_date"]
            .as_str()
            .filter(|d| d.len() == 8)
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y%m%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());

        let key = json["id"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| super::video_key(url));

        VideoMetadata {
            key,
            title,
            duration_seconds: json["duration"].as_f64(),
            channel,
            published_at,
            url: url.to_string(),
        }
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let source = YoutubeSource::new();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("https://youtube.com/playlist?list=PL1"), None);
        assert_eq!(source.extract_video_id(""), None);
    }

    #[test]
    fn test_parse_metadata() {
        let source = YoutubeSource::new();
        let json = serde_json::json!({
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "duration": 212.0,
            "uploader": "Rick Astley",
            "upload_date": "20091025"
        });

        let metadata = source.parse_metadata("https://youtu.be/dQw4w9WgXcQ", &json);
        assert_eq!(metadata.key, "dQw4w9WgXcQ");
        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.duration_seconds, Some(212.0));
        assert_eq!(metadata.channel.as_deref(), Some("Rick Astley"));
        assert_eq!(
            metadata.published_at.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2009-10-25".to_string())
        );
    }
}
