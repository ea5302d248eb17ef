//! LLM-graded evaluation of answers and summaries.

use crate::config::Prompts;
use crate::error::{AssistantError, Result};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::text::{char_len, char_slice};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A named grading criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion {
    pub name: &'static str,
    pub description: &'static str,
}

pub const QA_CRITERIA: [Criterion; 4] = [
    Criterion {
        name: "relevance",
        description: "The response directly addresses the question asked.",
    },
    Criterion {
        name: "accuracy",
        description: "The response only contains information from the video transcript.",
    },
    Criterion {
        name: "completeness",
        description: "The response thoroughly answers all aspects of the question.",
    },
    Criterion {
        name: "coherence",
        description: "The response is well-structured, logical, and easy to understand.",
    },
];

pub const SUMMARY_CRITERIA: [Criterion; 4] = [
    Criterion {
        name: "conciseness",
        description: "The summary captures the essential points without unnecessary details.",
    },
    Criterion {
        name: "comprehensiveness",
        description: "The summary covers all the important topics from the video.",
    },
    Criterion {
        name: "accuracy",
        description: "The summary only contains information from the video.",
    },
    Criterion {
        name: "coherence",
        description: "The summary flows logically and is well-structured.",
    },
];

/// Transcripts longer than this are sampled before grading.
const TRANSCRIPT_SAMPLE_THRESHOLD: usize = 10000;
const TRANSCRIPT_SAMPLES: usize = 10;
const SAMPLE_CHARS: usize = 1000;

/// Score for one criterion, between 0 and 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Scores for every graded criterion and their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub scores: Vec<CriterionScore>,
    pub mean: f64,
}

impl Evaluation {
    fn from_scores(scores: Vec<CriterionScore>) -> Self {
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
        };
        Self { scores, mean }
    }
}

/// Evenly spaced 1000-character samples of a long transcript.
pub fn sample_transcript(transcript: &str) -> String {
    let len = char_len(transcript);
    if len <= TRANSCRIPT_SAMPLE_THRESHOLD {
        return transcript.to_string();
    }

    let step = len / TRANSCRIPT_SAMPLES;
    (0..TRANSCRIPT_SAMPLES)
        .map(|i| char_slice(transcript, i * step, SAMPLE_CHARS))
        .collect::<Vec<_>>()
        .join("\n...\n")
}

fn describe_criteria(criteria: &[Criterion]) -> String {
    criteria
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the grader's JSON array, keeping known criteria with clamped scores.
pub fn parse_scores(response: &str, criteria: &[Criterion]) -> Result<Vec<CriterionScore>> {
    let start = response.find('[');
    let end = response.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => {
            return Err(AssistantError::Evaluation(
                "Grader response contains no JSON array".into(),
            ))
        }
    };

    let raw: Vec<CriterionScore> = serde_json::from_str(json)
        .map_err(|e| AssistantError::Evaluation(format!("Invalid grader JSON: {}", e)))?;

    let mut scores = Vec::new();
    for criterion in criteria {
        match raw
            .iter()
            .find(|s| s.criterion.eq_ignore_ascii_case(criterion.name))
        {
            Some(found) => scores.push(CriterionScore {
                criterion: criterion.name.to_string(),
                score: found.score.clamp(0.0, 1.0),
                reasoning: found.reasoning.trim().to_string(),
            }),
            None => warn!("Grader skipped criterion {}", criterion.name),
        }
    }

    if scores.is_empty() {
        return Err(AssistantError::Evaluation(
            "Grader response scored none of the criteria".into(),
        ));
    }
    Ok(scores)
}

/// Grades answers and summaries with a language model.
pub struct Evaluator {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    model: String,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, model: &str) -> Self {
        Self {
            llm,
            prompts,
            model: model.to_string(),
        }
    }

    /// Grade an answer to `question`, optionally against a reference answer.
    #[instrument(skip(self, answer, reference))]
    pub async fn evaluate_qa(
        &self,
        question: &str,
        answer: &str,
        reference: Option<&str>,
    ) -> Result<Evaluation> {
        self.grade(&QA_CRITERIA, question, answer, reference).await
    }

    /// Grade a summary against (a sample of) its transcript.
    #[instrument(skip_all)]
    pub async fn evaluate_summary(&self, transcript: &str, summary: &str) -> Result<Evaluation> {
        let sample = sample_transcript(transcript);
        self.grade(&SUMMARY_CRITERIA, &sample, summary, None).await
    }

    async fn grade(
        &self,
        criteria: &[Criterion],
        input: &str,
        prediction: &str,
        reference: Option<&str>,
    ) -> Result<Evaluation> {
        let criteria_text = describe_criteria(criteria);
        let reference = reference
            .map(|r| format!("\nReference answer:\n{}\n", r))
            .unwrap_or_default();

        let prompt = self.prompts.render_with_custom(
            &self.prompts.evaluation.grade,
            &[
                ("criteria", &criteria_text),
                ("input", input),
                ("prediction", prediction),
                ("reference", &reference),
            ],
        );

        let response = self
            .llm
            .complete(&self.model, &prompt, CompletionOptions::new(500, 0.0))
            .await?;
        debug!("Grader response: {}", response);

        Ok(Evaluation::from_scores(parse_scores(&response, criteria)?))
    }
}
