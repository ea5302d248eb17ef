//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::openai::is_api_key_configured;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing a video requires the media tools and an API key.
    Process,
    /// Questions, summaries and translations only need the API key.
    Query,
    /// Reading stored data has no external requirements.
    Read,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Process => {
            check_api_key()?;
            check_tool(&settings.audio.ytdlp_path)?;
            check_tool(&settings.audio.ffmpeg_path)?;
            check_tool(&settings.audio.ffprobe_path)?;
        }
        Operation::Query => {
            check_api_key()?;
        }
        Operation::Read => {}
    }
    Ok(())
}

fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(AssistantError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Arguments that print a tool's version.
pub fn version_args(tool: &str) -> &'static [&'static str] {
    let name = std::path::Path::new(tool)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(tool);
    // ffmpeg/ffprobe use -version (single dash)
    match name {
        "ffmpeg" | "ffprobe" => &["-version"],
        _ => &["--version"],
    }
}

/// Check if an external tool is available.
pub fn check_tool(tool: &str) -> Result<()> {
    match Command::new(tool).args(version_args(tool)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(AssistantError::ToolFailed(format!(
            "{} is installed but not working correctly",
            tool
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AssistantError::ToolNotFound(tool.to_string()))
        }
        Err(e) => Err(AssistantError::ToolFailed(format!("{}: {}", tool, e))),
    }
}
