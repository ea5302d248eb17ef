//! Remove command implementation.

use super::build_processor;
use crate::cli::Output;
use crate::config::Settings;
use crate::processor::resolve_key;
use anyhow::Result;

/// Run the remove command.
pub async fn run_remove(key: &str, settings: Settings) -> Result<()> {
    let processor = build_processor(settings, None)?;
    let key = resolve_key(key);

    match processor.remove_video(&key).await {
        Ok(chunks) => {
            Output::success(&format!("Removed {} ({} chunks)", key, chunks));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
