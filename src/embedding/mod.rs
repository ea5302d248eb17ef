//! Embeddings for transcript chunks and queries.
//!
//! Chunks and queries of one video must be embedded by the same model, since
//! similarity is only meaningful between vectors of the same space.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::{AssistantError, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed many texts; the result has one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text, typically a query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Embedding("Empty embedding response".to_string()))
    }

    /// Length of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
