//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod languages;
mod list;
mod process;
mod remove;
mod summarize;
mod transcript;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use languages::run_languages;
pub use list::run_list;
pub use process::run_process;
pub use remove::run_remove;
pub use summarize::run_summarize;
pub use transcript::run_transcript;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::AssistantError;
use crate::processor::{ProcessOptions, VideoProcessor};
use crate::progress::CliProgress;
use crate::source::{validate_url, video_key};
use anyhow::Result;

/// Build a processor, applying the `--parallel` override.
fn build_processor(settings: Settings, parallel: Option<usize>) -> Result<VideoProcessor> {
    let mut processor = VideoProcessor::new(settings)?;
    if let Some(n) = parallel {
        processor.set_parallelization(n);
    }
    Ok(processor)
}

/// Run pre-flight checks, pointing at `yta doctor` on failure.
fn preflight_or_exit(operation: Operation, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'yta doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

/// Storage key for `url`, processing the video first when it is not stored yet.
async fn ensure_processed(processor: &VideoProcessor, url: &str) -> Result<String> {
    validate_url(url)?;
    let key = video_key(url);

    match processor.transcript(&key).await {
        Ok(_) => Ok(key),
        Err(AssistantError::VideoNotFound(_)) => {
            preflight_or_exit(Operation::Process, processor.settings())?;
            Output::info("Video not processed yet, processing it first...");

            let progress = CliProgress::new();
            let result = processor
                .process_video(url, ProcessOptions::default(), &progress)
                .await?;
            Output::success(&format!(
                "Processed \"{}\" ({} chunks)",
                result.title, result.chunk_count
            ));
            Ok(result.video_key)
        }
        Err(e) => Err(e.into()),
    }
}
