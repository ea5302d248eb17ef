//! CLI module for yt-assistant.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{wrap_text, Output};

use clap::{Parser, Subcommand};

/// yt-assistant - ask questions about YouTube videos
///
/// Downloads a video's audio, transcribes it with Whisper and indexes the
/// transcript so it can be questioned, summarized and translated.
#[derive(Parser, Debug)]
#[command(name = "yta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Number of audio segments transcribed at once (1-5)
    #[arg(long, global = true)]
    pub parallel: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, transcribe and index a video
    Process {
        /// YouTube URL
        url: String,

        /// How much of the video to process (full, 5, 10, 15, 30, 60)
        #[arg(short, long, default_value = "full")]
        duration: String,

        /// Processing quality (standard, fast)
        #[arg(short, long, default_value = "standard")]
        quality: String,

        /// Reprocess even if the video is already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a question about a video (processes it first if needed)
    Ask {
        /// YouTube URL
        url: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks used as context
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=5))]
        k: u8,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Grade the answer with the evaluation model
        #[arg(long)]
        evaluate: bool,
    },

    /// Summarize a video (processes it first if needed)
    Summarize {
        /// YouTube URL
        url: String,

        /// Summary length (brief, moderate, detailed)
        #[arg(short, long, default_value = "moderate")]
        length: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Grade the summary with the evaluation model
        #[arg(long)]
        evaluate: bool,
    },

    /// Print or save the transcript of a processed video
    Transcript {
        /// YouTube URL or video key
        input: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Translate to this language code (see `yta languages`)
        #[arg(short, long)]
        translate: Option<String>,
    },

    /// List languages available for translation
    Languages,

    /// List processed videos
    List,

    /// Remove a processed video and its cached segments
    Remove {
        /// Video key (see `yta list`)
        key: String,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
