//! yt-assistant - Ask questions about YouTube videos
//!
//! Downloads the audio of a YouTube video, transcribes it with the OpenAI
//! Whisper API and indexes the transcript so it can be questioned,
//! summarized and translated.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `source` - YouTube URL validation, video ids and metadata
//! - `audio` - Download, compression, clipping and segmentation
//! - `cache` - Per-segment transcription cache for resumable runs
//! - `transcription` - Whisper transcription, single and segmented
//! - `text` - Transcript chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Per-video chunk storage and similarity search
//! - `llm` - Text generation
//! - `qa`, `summarize`, `language`, `evaluation` - Features on top of the index
//! - `processor` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use yt_assistant::config::Settings;
//! use yt_assistant::processor::{ProcessOptions, VideoProcessor};
//! use yt_assistant::progress::NoopProgress;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let processor = VideoProcessor::new(Settings::load()?)?;
//!
//!     let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
//!     let video = processor
//!         .process_video(url, ProcessOptions::default(), &NoopProgress)
//!         .await?;
//!
//!     let answer = processor
//!         .answer_question(&video.video_key, "What is the song about?", 2, None)
//!         .await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cache;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod language;
pub mod llm;
pub mod openai;
pub mod processor;
pub mod progress;
pub mod qa;
pub mod source;
pub mod summarize;
pub mod text;
pub mod transcription;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{AssistantError, Result};
