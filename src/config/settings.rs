//! Configuration settings for yt-assistant.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub models: ModelSettings,
    pub audio: AudioSettings,
    pub transcription: TranscriptionSettings,
    pub chunking: ChunkingSettings,
    pub storage: StorageSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary audio files.
    pub temp_dir: String,
    /// Directory for the segment transcription cache.
    pub cache_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.yt-assistant".to_string(),
            temp_dir: std::env::temp_dir()
                .join("yt-assistant")
                .to_string_lossy()
                .into_owned(),
            cache_dir: "~/.yt-assistant/cache".to_string(),
        }
    }
}

/// Models used for each API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model for question answering.
    pub qa_model: String,
    /// Model for summarization.
    pub summary_model: String,
    /// Speech-to-text model.
    pub transcription_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Embedding dimensions.
    pub embedding_dimensions: u32,
    /// Model for translation and language detection.
    pub translation_model: String,
    /// Model used to grade answers and summaries.
    pub evaluation_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            qa_model: "gpt-3.5-turbo-instruct".to_string(),
            summary_model: "gpt-3.5-turbo-instruct".to_string(),
            transcription_model: "whisper-1".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dimensions: 1536,
            translation_model: "gpt-3.5-turbo".to_string(),
            evaluation_model: "gpt-4".to_string(),
        }
    }
}

/// Audio download and compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Bitrate for videos up to the long-video threshold.
    pub default_bitrate: String,
    /// Bitrate for videos longer than the threshold.
    pub long_video_bitrate: String,
    /// Bitrate used by the fast processing quality.
    pub fast_bitrate: String,
    /// Duration in minutes above which a video counts as long.
    pub long_video_threshold_minutes: u32,
    /// Upload limit of the speech-to-text API in megabytes.
    pub max_upload_mb: u32,
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Path to the ffprobe binary.
    pub ffprobe_path: String,
    /// Path to the yt-dlp binary.
    pub ytdlp_path: String,
    /// Browser to borrow cookies from when downloading (None disables).
    pub cookies_browser: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            default_bitrate: "32k".to_string(),
            long_video_bitrate: "16k".to_string(),
            fast_bitrate: "6k".to_string(),
            long_video_threshold_minutes: 60,
            max_upload_mb: 25,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            cookies_browser: Some("chrome".to_string()),
        }
    }
}

/// Transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Segment length for long-video transcription.
    pub segment_minutes: u32,
    /// Maximum concurrent API requests (clamped to 1..=5).
    pub max_concurrent_requests: usize,
    /// Bitrate used when exporting segments.
    pub segment_bitrate: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            segment_minutes: 10,
            max_concurrent_requests: 3,
            segment_bitrate: "32k".to_string(),
        }
    }
}

impl TranscriptionSettings {
    /// Concurrency limit actually applied to API requests.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_requests.clamp(1, 5)
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Overlap used for long, segment-transcribed videos.
    pub long_video_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 8000,
            chunk_overlap: 500,
            long_video_overlap: 300,
        }
    }
}

/// Persistent storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path to the SQLite vector database.
    pub sqlite_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.yt-assistant/vectors.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file contents.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply overrides from the environment.
    ///
    /// Takes a lookup function so the same logic can run against a fixed map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.models.qa_model, "DEFAULT_QA_MODEL");
        set(&mut self.models.summary_model, "DEFAULT_SUMMARY_MODEL");
        set(&mut self.models.transcription_model, "TRANSCRIPTION_MODEL");
        set(&mut self.models.embedding_model, "EMBEDDINGS_MODEL");
        set(&mut self.general.cache_dir, "CACHE_DIR");
        set(&mut self.storage.sqlite_path, "DB_PATH");
        set(&mut self.audio.default_bitrate, "DEFAULT_BITRATE");
        set(&mut self.audio.long_video_bitrate, "LONG_VIDEO_BITRATE");
        set(&mut self.audio.ffmpeg_path, "FFMPEG_PATH");

        if let Some(value) = lookup("LONG_VIDEO_THRESHOLD_MINUTES") {
            self.audio.long_video_threshold_minutes = value.trim().parse().map_err(|_| {
                AssistantError::Config(format!(
                    "LONG_VIDEO_THRESHOLD_MINUTES must be a whole number, got '{}'",
                    value
                ))
            })?;
        }

        if let Some(value) = lookup("MAX_CONCURRENT_REQUESTS") {
            self.transcription.max_concurrent_requests = value.trim().parse().map_err(|_| {
                AssistantError::Config(format!(
                    "MAX_CONCURRENT_REQUESTS must be a whole number, got '{}'",
                    value
                ))
            })?;
        }

        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yt-assistant")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded segment cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.storage.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.models.qa_model, "gpt-3.5-turbo-instruct");
        assert_eq!(settings.models.transcription_model, "whisper-1");
        assert_eq!(settings.audio.default_bitrate, "32k");
        assert_eq!(settings.audio.long_video_bitrate, "16k");
        assert_eq!(settings.audio.long_video_threshold_minutes, 60);
        assert_eq!(settings.transcription.max_concurrent_requests, 3);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DEFAULT_QA_MODEL", "gpt-4o"),
            ("LONG_VIDEO_THRESHOLD_MINUTES", "90"),
            ("MAX_CONCURRENT_REQUESTS", "4"),
            ("DEFAULT_BITRATE", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.models.qa_model, "gpt-4o");
        assert_eq!(settings.audio.long_video_threshold_minutes, 90);
        assert_eq!(settings.transcription.max_concurrent_requests, 4);
        // Empty values leave the default in place
        assert_eq!(settings.audio.default_bitrate, "32k");
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut settings = Settings::default();
        let result = settings.apply_env_overrides(|k| {
            (k == "MAX_CONCURRENT_REQUESTS").then(|| "many".to_string())
        });
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn test_concurrency_clamp() {
        let mut transcription = TranscriptionSettings::default();
        transcription.max_concurrent_requests = 0;
        assert_eq!(transcription.concurrency(), 1);
        transcription.max_concurrent_requests = 12;
        assert_eq!(transcription.concurrency(), 5);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.models.summary_model = "gpt-4o".to_string();
        settings.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = toml::from_str(&content).unwrap();
        assert_eq!(loaded.models.summary_model, "gpt-4o");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: Settings = toml::from_str("[audio]\nmax_upload_mb = 20\n").unwrap();
        assert_eq!(loaded.audio.max_upload_mb, 20);
        assert_eq!(loaded.audio.default_bitrate, "32k");
        assert_eq!(loaded.chunking.chunk_size, 8000);
    }
}
