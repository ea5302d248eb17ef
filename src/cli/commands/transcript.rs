//! Transcript command implementation.

use super::{build_processor, preflight_or_exit};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::language::language_name;
use crate::processor::resolve_key;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(
    input: &str,
    output: Option<String>,
    translate: Option<String>,
    settings: Settings,
) -> Result<()> {
    if translate.is_some() {
        preflight_or_exit(Operation::Query, &settings)?;
    }

    let processor = build_processor(settings, None)?;
    let key = resolve_key(input);
    let record = match processor.transcript(&key).await {
        Ok(record) => record,
        Err(e) => {
            Output::error(&format!("{}", e));
            Output::info("Process the video first with 'yta process <url>'.");
            return Err(e.into());
        }
    };

    let text = match translate.as_deref() {
        Some(target) => {
            if language_name(target).is_none() {
                Output::warning(&format!(
                    "'{}' is not a supported language code, passing it to the model as is",
                    target
                ));
            }
            let spinner = Output::spinner("Translating transcript...");
            let translated = processor.translate_transcript(&key, target).await;
            spinner.finish_and_clear();
            translated?
        }
        None => record.transcript,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &text)?;
            Output::success(&format!("Transcript of \"{}\" written to {}", record.title, path));
        }
        None => println!("{}", text),
    }

    Ok(())
}
