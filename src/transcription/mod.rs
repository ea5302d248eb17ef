//! Speech-to-text transcription.
//!
//! Short audio goes to the API in a single request through
//! [`WhisperTranscriber`]. Long audio is cut into segments and transcribed
//! concurrently by [`ParallelTranscriber`], which caches every finished
//! segment so an interrupted run can resume.

mod parallel;
mod whisper;

pub use parallel::ParallelTranscriber;
pub use whisper::{WhisperApi, WhisperTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Result of transcribing one audio file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptionOutput {
    /// Transcript text.
    pub text: String,
    /// Language reported by the service, if any.
    pub language: Option<String>,
}

impl TranscriptionOutput {
    pub fn new(text: impl Into<String>, language: Option<String>) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file.
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionOutput>;
}
