//! Summarize command implementation.

use super::{build_processor, ensure_processed, preflight_or_exit};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::summarize::SummaryLength;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(
    url: &str,
    length: &str,
    model: Option<String>,
    evaluate: bool,
    parallel: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let length = length.parse::<SummaryLength>()?;

    preflight_or_exit(Operation::Query, &settings)?;
    let processor = build_processor(settings, parallel)?;
    let key = ensure_processed(&processor, url).await?;

    let spinner = Output::spinner(&format!(
        "Writing a {} summary...",
        length.to_string().to_lowercase()
    ));
    let result = processor
        .summarize_video(&key, model.as_deref(), length)
        .await;
    spinner.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Summary");
    Output::block(&summary);

    if evaluate {
        let record = processor.transcript(&key).await?;
        let spinner = Output::spinner("Evaluating summary...");
        let evaluation = processor
            .evaluator()
            .evaluate_summary(&record.transcript, &summary)
            .await;
        spinner.finish_and_clear();

        match evaluation {
            Ok(evaluation) => Output::evaluation(&evaluation),
            Err(e) => Output::warning(&format!("Evaluation failed: {}", e)),
        }
    }

    Ok(())
}
