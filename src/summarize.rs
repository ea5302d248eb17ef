//! Video summarization.
//!
//! Short videos are summarized in one request. Longer ones use map-reduce:
//! evenly spaced chunks are summarized individually and the section summaries
//! are then combined into one overall summary.

use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{AssistantError, Result};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::text::{char_len, estimate_tokens, normalize_whitespace, take_chars, truncate_with_ellipsis};
use crate::vector_store::VectorStore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Chunk count above which map-reduce is always used.
const DIRECT_MAX_CHUNKS: usize = 5;
const CONTEXT_TOKEN_BUDGET: usize = 3000;
const SECTION_MAX_CHARS: usize = 12000;
const SECTION_RETRY_CHARS: usize = 6000;
const SECTION_MAX_TOKENS: u32 = 100;
const COMBINED_MAX_CHARS: usize = 12000;
const BATCH_THRESHOLD: usize = 20;
const BATCH_SIZE: usize = 5;
const FALLBACK_CHARS: usize = 2000;
const TEMPERATURE: f32 = 0.3;

/// Desired summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SummaryLength {
    Brief,
    #[default]
    Moderate,
    Detailed,
}

impl SummaryLength {
    /// Chunks retrieved for a direct summary.
    fn direct_k(&self) -> usize {
        match self {
            SummaryLength::Brief => 3,
            SummaryLength::Moderate => 4,
            SummaryLength::Detailed => 5,
        }
    }

    fn direct_max_tokens(&self) -> u32 {
        match self {
            SummaryLength::Brief => 250,
            SummaryLength::Moderate => 350,
            SummaryLength::Detailed => 500,
        }
    }

    /// Chunks sampled for map-reduce.
    fn sample_size(&self) -> usize {
        match self {
            SummaryLength::Brief => 10,
            SummaryLength::Moderate => 15,
            SummaryLength::Detailed => 20,
        }
    }

    fn reduce_max_tokens(&self) -> u32 {
        match self {
            SummaryLength::Brief => 250,
            SummaryLength::Moderate => 400,
            SummaryLength::Detailed => 600,
        }
    }
}

impl FromStr for SummaryLength {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(SummaryLength::Brief),
            "moderate" => Ok(SummaryLength::Moderate),
            "detailed" => Ok(SummaryLength::Detailed),
            other => Err(AssistantError::InvalidInput(format!(
                "Unknown summary length: {} (expected brief, moderate or detailed)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SummaryLength::Brief => "Brief",
            SummaryLength::Moderate => "Moderate",
            SummaryLength::Detailed => "Detailed",
        };
        f.write_str(name)
    }
}

/// Evenly spaced chunk positions to summarize.
pub fn sample_positions(total: usize, sample_size: usize) -> Vec<usize> {
    if total <= sample_size {
        return (0..total).collect();
    }

    let step = (total / sample_size.max(1)).max(1);
    (0..total).step_by(step).take(sample_size).collect()
}

/// Join section summaries into the text handed to the reduce step.
///
/// Large sets are merged in batches; text that is still too long keeps the
/// first and last thirds plus a few summaries from the middle.
pub fn condense_summaries(mut summaries: Vec<String>) -> String {
    if summaries.len() > BATCH_THRESHOLD {
        summaries = summaries.chunks(BATCH_SIZE).map(|b| b.join(" ")).collect();
    }

    let mut combined = summaries.join(" ");
    if char_len(&combined) > COMBINED_MAX_CHARS {
        let third = summaries.len() / 3;
        let selected: Vec<&String> = summaries[..third]
            .iter()
            .chain(summaries[third..2 * third].iter().take(3))
            .chain(summaries[2 * third..].iter())
            .collect();
        combined = selected
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ");
    }

    if char_len(&combined) > COMBINED_MAX_CHARS {
        combined = take_chars(&combined, COMBINED_MAX_CHARS).to_string();
    }

    combined
}

/// Summary returned when the reduce step fails.
pub fn fallback_summary(combined: &str) -> String {
    format!(
        "This video is extremely long and contains too much content for a complete summary. \
         Here are key points from parts of the video: {}...",
        take_chars(combined, FALLBACK_CHARS)
    )
}

/// Summarizes processed videos.
pub struct Summarizer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
}

impl Summarizer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<Prompts>,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            prompts,
        }
    }

    /// Summarize a processed video.
    #[instrument(skip(self))]
    pub async fn summarize(&self, key: &str, model: &str, length: SummaryLength) -> Result<String> {
        let total = self.store.count(key).await?;
        if total == 0 {
            return Err(AssistantError::VideoNotFound(key.to_string()));
        }

        if total > DIRECT_MAX_CHUNKS {
            info!("{} chunks, using map-reduce summary", total);
            return self.map_reduce(key, model, length).await;
        }

        let query = self.embedder.embed("summary").await?;
        // Context keeps retrieval order, most similar first
        let docs = self
            .store
            .similarity_search(key, &query, length.direct_k())
            .await?;

        let context = docs
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if estimate_tokens(&context) > CONTEXT_TOKEN_BUDGET {
            info!("Context too large for a direct summary, using map-reduce");
            return self.map_reduce(key, model, length).await;
        }

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.direct, &[("docs", &context)]);
        let summary = self
            .llm
            .complete(
                model,
                &prompt,
                CompletionOptions::new(length.direct_max_tokens(), TEMPERATURE),
            )
            .await?;

        Ok(normalize_whitespace(&summary))
    }

    async fn summarize_section(&self, model: &str, content: &str) -> Result<String> {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.section, &[("docs", content)]);
        let summary = self
            .llm
            .complete(
                model,
                &prompt,
                CompletionOptions::new(SECTION_MAX_TOKENS, TEMPERATURE),
            )
            .await?;
        Ok(summary.trim().to_string())
    }

    #[instrument(skip(self))]
    async fn map_reduce(&self, key: &str, model: &str, length: SummaryLength) -> Result<String> {
        let docs = self.store.documents(key).await?;
        let positions = sample_positions(docs.len(), length.sample_size());
        debug!("Sampling chunks at positions {:?}", positions);

        let mut summaries = Vec::with_capacity(positions.len());
        for position in positions {
            let Some(doc) = docs.get(position) else {
                continue;
            };

            let content = truncate_with_ellipsis(&doc.content, SECTION_MAX_CHARS);
            match self.summarize_section(model, &content).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!("Section {} failed, retrying shorter: {}", position, e);
                    let shorter = format!("{}...", take_chars(&doc.content, SECTION_RETRY_CHARS));
                    match self.summarize_section(model, &shorter).await {
                        Ok(summary) => summaries.push(summary),
                        Err(e) => warn!("Skipping section {}: {}", position, e),
                    }
                }
            }
        }

        if summaries.is_empty() {
            return Err(AssistantError::Llm(
                "Could not summarize any section of the video".into(),
            ));
        }

        let combined = condense_summaries(summaries);
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.combine, &[("summaries", &combined)]);

        match self
            .llm
            .complete(
                model,
                &prompt,
                CompletionOptions::new(length.reduce_max_tokens(), TEMPERATURE),
            )
            .await
        {
            Ok(summary) => Ok(summary.trim().to_string()),
            Err(e) => {
                warn!("Combining summaries failed, returning excerpts: {}", e);
                Ok(fallback_summary(&combined))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEmbedder, FakeLlm};
    use crate::vector_store::{Document, MemoryVectorStore};

    async fn summarizer_with(chunks: usize, llm: Arc<FakeLlm>) -> Summarizer {
        let store = Arc::new(MemoryVectorStore::new());
        let docs: Vec<Document> = (0..chunks)
            .map(|i| Document::new("vid", i, format!("chunk number {}", i), vec![1.0, i as f32]))
            .collect();
        store.add_documents(&docs).await.unwrap();

        Summarizer::new(
            store,
            Arc::new(FakeEmbedder::new()),
            llm,
            Arc::new(Prompts::default()),
        )
    }

    #[test]
    fn test_length_parse() {
        assert_eq!("brief".parse::<SummaryLength>().unwrap(), SummaryLength::Brief);
        assert_eq!("Detailed".parse::<SummaryLength>().unwrap(), SummaryLength::Detailed);
        assert!("long".parse::<SummaryLength>().is_err());
        assert_eq!(SummaryLength::default(), SummaryLength::Moderate);
    }

    #[test]
    fn test_sample_positions() {
        assert_eq!(sample_positions(4, 10), vec![0, 1, 2, 3]);
        assert_eq!(sample_positions(25, 10), vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
        assert_eq!(sample_positions(30, 15), (0..30).step_by(2).collect::<Vec<_>>());
        assert_eq!(sample_positions(0, 10), Vec::<usize>::new());
    }

    #[test]
    fn test_condense_batches_large_sets() {
        let summaries: Vec<String> = (0..22).map(|i| format!("s{}", i)).collect();
        let combined = condense_summaries(summaries);
        assert!(combined.starts_with("s0 s1 s2 s3 s4 s5"));
        assert!(combined.ends_with("s20 s21"));
    }

    #[test]
    fn test_condense_keeps_ends_when_long() {
        let summaries: Vec<String> = (0..15)
            .map(|i| format!("{:02}{}", i, "x".repeat(898)))
            .collect();
        let combined = condense_summaries(summaries);

        // Thirds of 5: all of the first, 3 of the middle, all of the last
        assert!(combined.starts_with("00"));
        assert!(combined.contains(" 07x"));
        assert!(!combined.contains(" 08x"));
        assert!(!combined.contains(" 09x"));
        assert!(combined.contains(" 14x"));
        assert_eq!(char_len(&combined), 13 * 900 + 12);
    }

    #[test]
    fn test_fallback_summary() {
        let summary = fallback_summary(&"a".repeat(3000));
        assert!(summary.starts_with("This video is extremely long"));
        assert!(summary.ends_with(&format!("{}...", "a".repeat(10))));
        assert_eq!(char_len(&summary), char_len(&fallback_summary("")) + 2000);
    }

    #[tokio::test]
    async fn test_direct_summary_for_short_video() {
        let llm = Arc::new(FakeLlm::replying("  A short\n\nsummary.  "));
        let summarizer = summarizer_with(3, llm.clone()).await;

        let summary = summarizer
            .summarize("vid", "gpt-3.5-turbo-instruct", SummaryLength::Brief)
            .await
            .unwrap();
        assert_eq!(summary, "A short summary.");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options, CompletionOptions::new(250, 0.3));
        // Equal scores keep transcript order
        let p0 = calls[0].prompt.find("chunk number 0").unwrap();
        let p2 = calls[0].prompt.find("chunk number 2").unwrap();
        assert!(p0 < p2);
    }

    #[tokio::test]
    async fn test_direct_summary_uses_retrieval_order() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(FakeEmbedder::new());
        let texts = vec![
            "opening remarks".to_string(),
            "a side story".to_string(),
            "summary summary of the talk".to_string(),
        ];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();
        let docs: Vec<Document> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| Document::new("vid", i, text, embedding))
            .collect();
        store.add_documents(&docs).await.unwrap();

        let llm = Arc::new(FakeLlm::replying("done"));
        let summarizer = Summarizer::new(store, embedder, llm.clone(), Arc::new(Prompts::default()));
        summarizer
            .summarize("vid", "gpt-4", SummaryLength::Brief)
            .await
            .unwrap();

        let prompt = &llm.calls()[0].prompt;
        let best = prompt.find("summary summary of the talk").unwrap();
        let first = prompt.find("opening remarks").unwrap();
        assert!(best < first, "{}", prompt);
    }

    #[tokio::test]
    async fn test_map_reduce_for_long_video() {
        let llm = Arc::new(FakeLlm::new(|_, prompt| {
            if prompt.contains("Overall video summary") {
                Ok("Overall.".to_string())
            } else {
                Ok("Section.".to_string())
            }
        }));
        let summarizer = summarizer_with(8, llm.clone()).await;

        let summary = summarizer
            .summarize("vid", "gpt-4", SummaryLength::Detailed)
            .await
            .unwrap();
        assert_eq!(summary, "Overall.");

        let calls = llm.calls();
        // 8 sections plus the reduce step
        assert_eq!(calls.len(), 9);
        assert_eq!(calls[0].options, CompletionOptions::new(100, 0.3));
        assert_eq!(calls[8].options, CompletionOptions::new(600, 0.3));
    }

    #[tokio::test]
    async fn test_reduce_failure_falls_back() {
        let llm = Arc::new(FakeLlm::new(|_, prompt| {
            if prompt.contains("Overall video summary") {
                Err(AssistantError::Llm("context length exceeded".into()))
            } else {
                Ok("Section.".to_string())
            }
        }));
        let summarizer = summarizer_with(6, llm).await;

        let summary = summarizer
            .summarize("vid", "gpt-4", SummaryLength::Brief)
            .await
            .unwrap();
        assert!(summary.starts_with("This video is extremely long"));
        assert!(summary.contains("Section. Section."));
    }

    #[tokio::test]
    async fn test_all_sections_failing_is_an_error() {
        let summarizer = summarizer_with(6, Arc::new(FakeLlm::failing())).await;
        let result = summarizer
            .summarize("vid", "gpt-4", SummaryLength::Brief)
            .await;
        assert!(matches!(result, Err(AssistantError::Llm(_))));
    }

    #[tokio::test]
    async fn test_unknown_video() {
        let summarizer = summarizer_with(0, Arc::new(FakeLlm::replying("x"))).await;
        let result = summarizer
            .summarize("missing", "gpt-4", SummaryLength::Brief)
            .await;
        assert!(matches!(result, Err(AssistantError::VideoNotFound(_))));
    }
}
