//! OpenAI Whisper transcription implementation.

use super::{Transcriber, TranscriptionOutput};
use crate::audio::{file_size_mb, MediaTools, UploadFormat};
use crate::error::{AssistantError, Result};
use crate::openai::{create_client, OpenAIClient};
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A single Whisper API request with verbose JSON output.
pub struct WhisperApi {
    client: OpenAIClient,
    model: String,
}

impl WhisperApi {
    pub fn new(client: OpenAIClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperApi {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionOutput> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| AssistantError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| AssistantError::OpenAI(format!("Whisper API error: {}", e)))?;

        let language = Some(response.language.trim().to_string()).filter(|l| !l.is_empty());
        debug!(
            "Transcribed {:.0}s of audio (language: {:?})",
            response.duration, language
        );

        Ok(TranscriptionOutput::new(response.text.trim(), language))
    }
}

/// OpenAI Whisper-based transcriber.
///
/// A rejected upload is retried after re-encoding to MP3 and then to WAV.
pub struct WhisperTranscriber {
    api: Arc<dyn Transcriber>,
    tools: MediaTools,
    max_upload_mb: u32,
}

impl WhisperTranscriber {
    /// Create a new transcriber.
    pub fn new(model: &str, tools: MediaTools, max_upload_mb: u32) -> Result<Self> {
        Ok(Self::with_client(create_client()?, model, tools, max_upload_mb))
    }

    /// Create a transcriber around an existing client.
    pub fn with_client(
        client: OpenAIClient,
        model: &str,
        tools: MediaTools,
        max_upload_mb: u32,
    ) -> Self {
        Self::with_api(Arc::new(WhisperApi::new(client, model)), tools, max_upload_mb)
    }

    /// Wrap any single-request transcriber with the size checks and re-encode fallbacks.
    pub fn with_api(api: Arc<dyn Transcriber>, tools: MediaTools, max_upload_mb: u32) -> Self {
        Self {
            api,
            tools,
            max_upload_mb,
        }
    }

    /// Reject files the API would refuse before uploading them.
    fn check_upload(&self, audio_path: &Path) -> Result<()> {
        if !audio_path.exists() {
            return Err(AssistantError::FileNotFound(
                audio_path.display().to_string(),
            ));
        }

        let size_mb = file_size_mb(audio_path)?;
        if size_mb > f64::from(self.max_upload_mb) {
            return Err(AssistantError::FileTooLarge {
                size_mb,
                max_mb: self.max_upload_mb,
            });
        }

        Ok(())
    }

    /// Re-encode into `format` and try again.
    async fn retry_as(&self, audio_path: &Path, format: UploadFormat) -> Result<TranscriptionOutput> {
        let temp_dir = tempfile::tempdir()?;
        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let converted = temp_dir
            .path()
            .join(format!("{}_retry.{}", stem, format.extension()));

        self.tools
            .reencode_for_upload(audio_path, &converted, format)
            .await?;
        self.check_upload(&converted)?;

        self.api.transcribe(&converted).await
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionOutput> {
        self.check_upload(audio_path)?;

        let original_error = match self.api.transcribe(audio_path).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };
        warn!("Transcription failed, retrying with MP3 re-encode: {}", original_error);

        let mut final_error = original_error.to_string();
        for format in [UploadFormat::Mp3, UploadFormat::Wav] {
            match self.retry_as(audio_path, format).await {
                Ok(output) => {
                    info!("Transcription succeeded after {:?} re-encode", format);
                    return Ok(output);
                }
                Err(e) => {
                    warn!("{:?} fallback failed: {}", format, e);
                    final_error = e.to_string();
                }
            }
        }

        Err(AssistantError::Transcription(format!(
            "All transcription methods failed (original upload, MP3 and WAV re-encodes). Original error: {}. Final error: {}",
            original_error, final_error
        )))
    }
}
