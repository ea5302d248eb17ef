//! List command implementation.

use super::build_processor;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let processor = build_processor(settings, None)?;

    match processor.list_videos().await {
        Ok(videos) => {
            if videos.is_empty() {
                Output::info("No videos processed yet. Use 'yta process <url>' to add one.");
            } else {
                Output::header(&format!("Processed videos ({})", videos.len()));
                println!();

                for video in &videos {
                    Output::video_info(
                        &video.title,
                        &video.video_key,
                        video.chunk_count,
                        video.duration_seconds,
                    );
                }

                let total_chunks: usize = videos.iter().map(|v| v.chunk_count).sum();
                println!();
                Output::kv("Total videos", &videos.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
