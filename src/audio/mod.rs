//! Audio download and processing.
//!
//! yt-dlp fetches the audio track, ffmpeg compresses, clips and segments it,
//! and ffprobe reads durations. All three are driven through [`MediaTools`].

mod downloader;
mod processing;

pub use processing::{segment_plan, UploadFormat};

use crate::config::AudioSettings;
use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;

/// Bitrate tried before clipping when a file is far over the upload limit.
pub const EMERGENCY_BITRATE: &str = "4k";

/// How much of a video to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurationLimit {
    #[default]
    Full,
    FirstMinutes(u32),
}

impl DurationLimit {
    /// Minute values accepted for a partial run.
    pub const ALLOWED_MINUTES: [u32; 5] = [5, 10, 15, 30, 60];

    /// Limit in seconds, or None for the whole video.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            DurationLimit::Full => None,
            DurationLimit::FirstMinutes(m) => Some(f64::from(*m) * 60.0),
        }
    }
}

impl FromStr for DurationLimit {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        if value == "full" {
            return Ok(DurationLimit::Full);
        }

        let minutes: u32 = value
            .trim_end_matches("min")
            .parse()
            .map_err(|_| AssistantError::InvalidInput(format!("Unknown duration: {}", s)))?;

        if Self::ALLOWED_MINUTES.contains(&minutes) {
            Ok(DurationLimit::FirstMinutes(minutes))
        } else {
            Err(AssistantError::InvalidInput(format!(
                "Duration must be one of full, 5, 10, 15, 30, 60 (got {})",
                s
            )))
        }
    }
}

impl std::fmt::Display for DurationLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationLimit::Full => write!(f, "full video"),
            DurationLimit::FirstMinutes(m) => write!(f, "first {} minutes", m),
        }
    }
}

/// Trade-off between transcription accuracy and processing speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingQuality {
    #[default]
    Standard,
    Fast,
}

impl FromStr for ProcessingQuality {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ProcessingQuality::Standard),
            "fast" => Ok(ProcessingQuality::Fast),
            other => Err(AssistantError::InvalidInput(format!(
                "Unknown quality: {} (expected standard or fast)",
                other
            ))),
        }
    }
}

/// A time slice of a longer audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub index: usize,
    pub path: PathBuf,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Choose the compression bitrate for a video.
pub fn select_bitrate(
    duration_seconds: f64,
    settings: &AudioSettings,
    quality: ProcessingQuality,
) -> String {
    if quality == ProcessingQuality::Fast {
        return settings.fast_bitrate.clone();
    }

    let threshold = f64::from(settings.long_video_threshold_minutes) * 60.0;
    if duration_seconds > threshold {
        settings.long_video_bitrate.clone()
    } else {
        settings.default_bitrate.clone()
    }
}

/// Parse a bitrate such as "32k" into kilobits per second.
pub fn bitrate_kbps(bitrate: &str) -> Result<u32> {
    let trimmed = bitrate.trim().to_lowercase();
    let digits = trimmed.strip_suffix('k').unwrap_or(&trimmed);

    match digits.parse::<u32>() {
        Ok(kbps) if kbps > 0 => Ok(kbps),
        _ => Err(AssistantError::Config(format!("Invalid bitrate: {}", bitrate))),
    }
}

/// Longest duration in whole seconds that fits in `max_mb` at `bitrate`.
pub fn size_limit_seconds(bitrate: &str, max_mb: u32) -> Result<u64> {
    let kbps = bitrate_kbps(bitrate)?;
    let bits = u64::from(max_mb) * 1024 * 1024 * 8;
    Ok(bits / (u64::from(kbps) * 1024))
}

/// Size of a file in megabytes.
pub fn file_size_mb(path: &Path) -> Result<f64> {
    let bytes = std::fs::metadata(path)?.len();
    Ok(bytes as f64 / (1024.0 * 1024.0))
}

/// Locations of the external media tools.
#[derive(Debug, Clone)]
pub struct MediaTools {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub ytdlp: String,
    pub cookies_browser: Option<String>,
}

impl MediaTools {
    pub fn from_settings(settings: &AudioSettings) -> Self {
        Self {
            ffmpeg: settings.ffmpeg_path.clone(),
            ffprobe: settings.ffprobe_path.clone(),
            ytdlp: settings.ytdlp_path.clone(),
            cookies_browser: settings.cookies_browser.clone(),
        }
    }

    /// Run ffmpeg with the given arguments, mapping failures to `AudioProcessing`.
    async fn ffmpeg(&self, args: &[&str], what: &str) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| tool_error(&self.ffmpeg, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistantError::AudioProcessing(format!(
                "{} failed: {}",
                what,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Query the duration of an audio file using ffprobe with JSON output.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .await
            .map_err(|e| tool_error(&self.ffprobe, e))?;

        if !output.status.success() {
            return Err(AssistantError::AudioProcessing(format!(
                "ffprobe could not read {}",
                path.display()
            )));
        }

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|_| AssistantError::AudioProcessing("Invalid ffprobe output".into()))?;

        parse_probe_duration(&parsed).ok_or_else(|| {
            AssistantError::AudioProcessing("Could not determine audio duration".into())
        })
    }
}

/// Read `format.duration` from ffprobe's JSON output.
fn parse_probe_duration(json: &serde_json::Value) -> Option<f64> {
    json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| json["format"]["duration"].as_f64())
}

/// Map a spawn failure to the right error variant.
fn tool_error(tool: &str, e: std::io::Error) -> AssistantError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AssistantError::ToolNotFound(tool.to_string())
    } else {
        AssistantError::ToolFailed(format!("{} execution failed: {}", tool, e))
    }
}
