//! Process command implementation.

use super::{build_processor, preflight_or_exit};
use crate::audio::{DurationLimit, ProcessingQuality};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::processor::ProcessOptions;
use crate::progress::{CliProgress, ProgressReporter};
use anyhow::Result;

/// Run the process command.
pub async fn run_process(
    url: &str,
    duration: &str,
    quality: &str,
    force: bool,
    parallel: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let options = ProcessOptions {
        duration: duration.parse::<DurationLimit>()?,
        quality: quality.parse::<ProcessingQuality>()?,
        force,
    };

    preflight_or_exit(Operation::Process, &settings)?;
    let processor = build_processor(settings, parallel)?;

    Output::info(&format!(
        "Processing {} ({}, {} segment(s) at a time)",
        url,
        options.duration,
        processor.parallelization()
    ));

    let progress = CliProgress::new();
    let result = processor.process_video(url, options, &progress).await;
    progress.finish();

    match result {
        Ok(video) => {
            if video.from_cache {
                Output::success("Video already processed, using the existing database.");
                Output::info("Use --force to process it again.");
            } else {
                Output::success("Processing complete.");
            }
            Output::kv("Title", &video.title);
            Output::kv("Key", &video.video_key);
            Output::kv("Chunks", &video.chunk_count.to_string());
            if !video.from_cache {
                Output::kv("Audio size", &format!("{:.2} MB", video.audio_size_mb));
            }
        }
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
