//! Ask command implementation.

use super::{build_processor, ensure_processed, preflight_or_exit};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Snippets printed below an answer.
const MAX_SNIPPETS: usize = 2;

/// Run the ask command.
pub async fn run_ask(
    url: &str,
    question: &str,
    k: u8,
    model: Option<String>,
    evaluate: bool,
    parallel: Option<usize>,
    settings: Settings,
) -> Result<()> {
    preflight_or_exit(Operation::Query, &settings)?;
    let processor = build_processor(settings, parallel)?;
    let key = ensure_processed(&processor, url).await?;

    let spinner = Output::spinner("Searching the transcript...");
    let result = processor
        .answer_question(&key, question, usize::from(k), model.as_deref())
        .await;
    spinner.finish_and_clear();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Answer");
    Output::block(&answer.text);

    if !answer.sources.is_empty() {
        Output::header("Matched snippets");
        for (i, source) in answer.sources.iter().take(MAX_SNIPPETS).enumerate() {
            Output::snippet(i + 1, &source.content);
        }
        println!();
    }

    if evaluate {
        let spinner = Output::spinner("Evaluating answer...");
        let evaluation = processor
            .evaluator()
            .evaluate_qa(question, &answer.text, None)
            .await;
        spinner.finish_and_clear();

        match evaluation {
            Ok(evaluation) => Output::evaluation(&evaluation),
            Err(e) => Output::warning(&format!("Evaluation failed: {}", e)),
        }
    }

    Ok(())
}
