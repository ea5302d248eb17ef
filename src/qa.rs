//! Question answering over a video's transcript chunks.

use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::text::{char_len, char_slice, estimate_tokens, take_chars};
use crate::vector_store::{Document, VectorStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reply used when nothing has been indexed for a video.
pub const NO_ANSWER: &str = "I don't know";

/// Similarity above which a chunk counts as relevant.
const RELEVANCE_THRESHOLD: f32 = 0.7;
/// Context budget for the answer prompt, in estimated tokens.
const CONTEXT_TOKEN_BUDGET: usize = 3000;
/// Character target when shrinking documents proportionally.
const PROPORTIONAL_TARGET_CHARS: usize = 12000;
/// Smallest share of each document kept by proportional shrinking.
const MIN_KEEP_RATIO: f64 = 0.2;
/// Length of the excerpts used as a last resort.
const EXCERPT_CHARS: usize = 300;

/// An answer and the chunks it was based on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Document>,
}

impl Answer {
    fn unknown() -> Self {
        Self {
            text: NO_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Sampling parameters for answer generation.
pub fn answer_options(model: &str) -> CompletionOptions {
    if model.contains("gpt-4") {
        CompletionOptions::new(750, 0.1)
    } else {
        CompletionOptions::new(500, 0.0)
    }
}

/// Shrink retrieved documents until they fit the context budget.
///
/// Drops to the two best documents first, then shrinks each proportionally,
/// and finally falls back to short excerpts.
pub fn fit_context(mut docs: Vec<String>) -> Vec<String> {
    let tokens = |docs: &[String]| estimate_tokens(&docs.join(" "));

    if tokens(&docs) <= CONTEXT_TOKEN_BUDGET {
        return docs;
    }

    if docs.len() > 2 {
        docs.truncate(2);
        debug!("Context over budget, keeping the top 2 documents");
        if tokens(&docs) <= CONTEXT_TOKEN_BUDGET {
            return docs;
        }
    }

    let total_chars = char_len(&docs.join(" "));
    let ratio = PROPORTIONAL_TARGET_CHARS as f64 / total_chars.max(1) as f64;
    docs = docs
        .iter()
        .map(|d| {
            let len = char_len(d) as f64;
            let keep = (len * ratio).max(len * MIN_KEEP_RATIO).floor() as usize;
            take_chars(d, keep).to_string()
        })
        .collect();
    debug!("Context over budget, truncated documents by ratio {:.2}", ratio);

    if tokens(&docs) <= CONTEXT_TOKEN_BUDGET {
        return docs;
    }

    docs.iter()
        .map(|d| take_chars(d, EXCERPT_CHARS).to_string())
        .collect()
}

/// Lowercased whitespace-separated words of a question.
pub fn query_terms(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Best excerpt of `content` for the given query terms.
///
/// Scans 300-character windows in steps of 50 and returns 250 characters
/// starting 50 characters before the window that contains the most terms.
pub fn best_excerpt(content: &str, terms: &[String]) -> String {
    const WINDOW: usize = 300;
    const STEP: usize = 50;
    const EXCERPT: usize = 250;

    // Offsets are counted on `content` itself; lowercasing can change the char count
    let len = char_len(content);

    let mut best_start = 0;
    let mut best_score = 0;
    let mut start = 0;
    while start < len.max(1) {
        let window = char_slice(content, start, WINDOW).to_lowercase();
        let score = terms.iter().filter(|t| window.contains(t.as_str())).count();
        if score > best_score {
            best_score = score;
            best_start = start;
        }
        start += STEP;
    }

    char_slice(content, best_start.saturating_sub(STEP), EXCERPT).to_string()
}

/// Answers questions about processed videos.
pub struct QuestionAnswerer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
}

impl QuestionAnswerer {
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

    /// Answer using up to `k` retrieved chunks.
    #[instrument(skip(self))]
    pub async fn answer(&self, key: &str, question: &str, k: usize, model: &str) -> Result<Answer> {
        if self.store.count(key).await? == 0 {
            return Ok(Answer::unknown());
        }

        let k = k.max(1);
        let query = self.embedder.embed(question).await?;
        let scored = self
            .store
            .similarity_search_with_scores(key, &query, k * 2)
            .await?;

        let relevant: Vec<_> = scored
            .iter()
            .filter(|r| r.score > RELEVANCE_THRESHOLD)
            .cloned()
            .collect();

        let chosen = if relevant.len() < k {
            debug!(
                "Only {} chunks above {:.1}, using the top {} overall",
                relevant.len(),
                RELEVANCE_THRESHOLD,
                k
            );
            scored.into_iter().take(k).collect::<Vec<_>>()
        } else {
            relevant.into_iter().take(k).collect()
        };

        let sources: Vec<Document> = chosen.into_iter().map(|r| r.document).collect();
        let context = fit_context(sources.iter().map(|d| d.content.clone()).collect());
        let docs = context.join(" ");

        let prompt = self.prompts.render_with_custom(
            &self.prompts.qa.answer,
            &[("question", question), ("docs", &docs)],
        );

        info!("Answering with {} chunks using {}", sources.len(), model);
        let text = self
            .llm
            .complete(model, &prompt, answer_options(model))
            .await?;

        Ok(Answer { text, sources })
    }

    /// Answer from short excerpts of the two best chunks.
    #[instrument(skip(self))]
    pub async fn simple_answer(&self, key: &str, question: &str, model: &str) -> Result<Answer> {
        if self.store.count(key).await? == 0 {
            return Ok(Answer::unknown());
        }

        let query = self.embedder.embed(question).await?;
        let sources = self.store.similarity_search(key, &query, 2).await?;

        let terms = query_terms(question);

        let docs = sources
            .iter()
            .map(|d| best_excerpt(&d.content, &terms))
            .collect::<Vec<_>>()
            .join(" ");

        let prompt = self.prompts.render_with_custom(
            &self.prompts.qa.simple,
            &[("question", question), ("docs", &docs)],
        );

        let text = self
            .llm
            .complete(model, &prompt, CompletionOptions::new(300, 0.0))
            .await?;

        Ok(Answer { text, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEmbedder, FakeLlm};
    use crate::vector_store::MemoryVectorStore;

    async fn store_with(chunks: &[&str]) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = FakeEmbedder::new();
        let texts: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        let docs: Vec<Document> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, emb))| Document::new("vid", i, text, emb))
            .collect();
        store.add_documents(&docs).await.unwrap();
        store
    }

    fn answerer(store: Arc<MemoryVectorStore>, llm: Arc<FakeLlm>) -> QuestionAnswerer {
        QuestionAnswerer::new(
            store,
            Arc::new(FakeEmbedder::new()),
            llm,
            Arc::new(Prompts::default()),
        )
    }

    #[tokio::test]
    async fn test_empty_collection_skips_llm() {
        let llm = Arc::new(FakeLlm::replying("should not be called"));
        let qa = answerer(Arc::new(MemoryVectorStore::new()), llm.clone());

        let answer = qa.answer("vid", "What is Rust?", 2, "gpt-4").await.unwrap();
        assert_eq!(answer.text, NO_ANSWER);
        assert!(answer.sources.is_empty());

        let answer = qa.simple_answer("vid", "What is Rust?", "gpt-4").await.unwrap();
        assert_eq!(answer.text, NO_ANSWER);
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_uses_best_chunks() {
        let store = store_with(&[
            "rust ownership borrowing lifetimes",
            "cooking pasta with tomato sauce",
            "gardening tips for spring",
        ])
        .await;
        let llm = Arc::new(FakeLlm::replying("Ownership is about borrowing."));
        let qa = answerer(store, llm.clone());

        let answer = qa
            .answer("vid", "rust ownership borrowing lifetimes", 1, "gpt-4")
            .await
            .unwrap();

        assert_eq!(answer.text, "Ownership is about borrowing.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].chunk_index, 0);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options, CompletionOptions::new(750, 0.1));
        assert!(calls[0].prompt.contains("rust ownership borrowing lifetimes"));
        assert!(!calls[0].prompt.contains("{{docs}}"));
    }

    #[tokio::test]
    async fn test_answer_falls_back_to_top_k() {
        let store = store_with(&["alpha beta", "gamma delta", "epsilon zeta"]).await;
        let llm = Arc::new(FakeLlm::replying("ok"));
        let qa = answerer(store, llm.clone());

        // Nothing is relevant, so the top k overall are used
        let answer = qa
            .answer("vid", "unrelated words", 2, "gpt-3.5-turbo-instruct")
            .await
            .unwrap();
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(llm.calls()[0].options, CompletionOptions::new(500, 0.0));
    }

    #[test]
    fn test_fit_context_within_budget() {
        let docs = vec!["short".to_string(), "also short".to_string()];
        assert_eq!(fit_context(docs.clone()), docs);
    }

    #[test]
    fn test_fit_context_keeps_top_two() {
        let docs = vec!["a".repeat(5000), "b".repeat(5000), "c".repeat(5000)];
        let fitted = fit_context(docs);
        assert_eq!(fitted.len(), 2);
        assert_eq!(char_len(&fitted[0]), 5000);
    }

    #[test]
    fn test_fit_context_proportional() {
        let docs = vec!["a".repeat(10000), "b".repeat(6000)];
        let fitted = fit_context(docs);
        // ratio = 12000 / 16001 (the joined length)
        assert_eq!(char_len(&fitted[0]), 7499);
        assert_eq!(char_len(&fitted[1]), 4499);
    }

    #[test]
    fn test_fit_context_excerpts() {
        // The 20% floor keeps each doc over budget, so excerpts are used
        let docs = vec!["a".repeat(40000), "b".repeat(40000)];
        let fitted = fit_context(docs);
        assert!(fitted.iter().all(|d| char_len(d) == 300));
    }

    #[test]
    fn test_best_excerpt() {
        // The phrase sits at 500..537, so the first window holding both terms starts at 250
        let content = format!(
            "{}the borrow checker enforces ownership{}",
            "x ".repeat(250),
            " y".repeat(300)
        );
        let terms = vec!["borrow".to_string(), "ownership".to_string()];

        let excerpt = best_excerpt(&content, &terms);
        assert_eq!(char_len(&excerpt), 250);
        assert_eq!(excerpt, char_slice(&content, 200, 250));

        assert_eq!(best_excerpt("tiny", &terms), "tiny");
    }

    #[test]
    fn test_best_excerpt_offsets_survive_case_folding() {
        // 'İ' lowercases to two chars, which must not shift the excerpt
        let content = format!(
            "{}the Borrow checker enforces OWNERSHIP{}",
            "İ ".repeat(250),
            " y".repeat(300)
        );
        let terms = vec!["borrow".to_string(), "ownership".to_string()];

        let excerpt = best_excerpt(&content, &terms);
        assert_eq!(excerpt, char_slice(&content, 200, 250));
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(
            query_terms("What is  Ownership?"),
            vec!["what", "is", "ownership?"]
        );
        assert!(query_terms("   ").is_empty());
    }
}
