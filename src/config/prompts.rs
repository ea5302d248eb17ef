//! Prompt templates for yt-assistant.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub summary: SummaryPrompts,
    pub translation: TranslationPrompts,
    pub evaluation: EvaluationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    /// Full answer over retrieved transcript chunks.
    pub answer: String,
    /// Short answer over small excerpts.
    pub simple: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            answer: r#"You are a helpful assistant that can answer questions about YouTube videos
based on the video's transcript.

Answer the following question: {{question}}
By searching the following video transcript: {{docs}}

Only use the factual information from the transcript to answer the question.
If you feel like you don't have enough information to answer the question, say "I don't know".
Your answers should be detailed but concise."#
                .to_string(),

            simple: r#"Answer this question briefly: {{question}}
Based on these transcript excerpts: {{docs}}
Keep your answer concise and factual."#
                .to_string(),
        }
    }
}

/// Prompts for summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Single-pass summary of a short transcript.
    pub direct: String,
    /// Summary of one section (map step).
    pub section: String,
    /// Combination of section summaries (reduce step).
    pub combine: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            direct: r#"Summarize the following video transcript in a clear, concise way. Focus on the main ideas, important moments, and relevant discussion points.

Transcript:
{{docs}}

Summary:"#
                .to_string(),

            section: r#"Briefly summarize this section of a video transcript in 2-3 sentences:
{{docs}}

Very brief summary:"#
                .to_string(),

            combine: r#"Below are summaries from different parts of a video. Create a coherent overall summary
that captures the main points and narrative of the entire video:

{{summaries}}

Overall video summary:"#
                .to_string(),
        }
    }
}

/// Prompts for translation and language detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub translate: String,
    pub detect: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            translate: r#"You are a professional translator. Translate the following text to {{language}}. Preserve formatting, line breaks, and special characters as much as possible. Translate only the content, not any metadata or markers.

{{text}}"#
                .to_string(),

            detect: r#"Identify the language of the following text. Respond with only its two-letter ISO 639-1 code (for example "en" or "es") and nothing else.

{{text}}"#
                .to_string(),
        }
    }
}

/// Prompts for grading answers and summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationPrompts {
    pub grade: String,
}

impl Default for EvaluationPrompts {
    fn default() -> Self {
        Self {
            grade: r#"You are grading the output of an assistant that works from YouTube video transcripts.

Criteria:
{{criteria}}

Input:
{{input}}

Output to grade:
{{prediction}}
{{reference}}
For every criterion give a score between 0.0 (fails completely) and 1.0 (fully satisfies) and a one-sentence reasoning.

Respond with a JSON array only. Example:
[
  {"criterion": "relevance", "score": 0.9, "reasoning": "Directly answers the question."}
]"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                prompts.qa = toml::from_str(&std::fs::read_to_string(&qa_path)?)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                prompts.summary = toml::from_str(&std::fs::read_to_string(&summary_path)?)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                prompts.translation =
                    toml::from_str(&std::fs::read_to_string(&translation_path)?)?;
            }

            let evaluation_path = custom_path.join("evaluation.toml");
            if evaluation_path.exists() {
                prompts.evaluation =
                    toml::from_str(&std::fs::read_to_string(&evaluation_path)?)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.to_string(), value.to_string());
        }
        Self::render(template, &merged)
    }
}
