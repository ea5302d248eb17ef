//! Error types for yt-assistant.

use thiserror::Error;

/// Library-level error type for yt-assistant operations.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Audio file not found after download. Check if the video is private or restricted: {0}")]
    AudioNotFound(String),

    #[error("Audio processing failed: {0}")]
    AudioProcessing(String),

    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    #[error("Audio file is too large: {size_mb:.2}MB (max {max_mb}MB)")]
    FileTooLarge { size_mb: f64, max_mb: u32 },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcription cache error: {0}")]
    Cache(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Video not processed yet: {0}")]
    VideoNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for yt-assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
