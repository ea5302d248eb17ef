//! Vector store abstraction for yt-assistant.
//!
//! Every processed video owns a collection of embedded transcript chunks plus
//! one [`VideoRecord`] with its metadata and full transcript. Searches are
//! always scoped to a single video.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An embedded transcript chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Key of the video this chunk belongs to.
    pub video_key: String,
    /// Position of this chunk in the transcript.
    pub chunk_index: usize,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(video_key: &str, chunk_index: usize, content: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_key: video_key.to_string(),
            chunk_index,
            content,
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// A processed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_key: String,
    pub url: String,
    pub title: String,
    pub duration_seconds: Option<f64>,
    /// Full transcript text.
    pub transcript: String,
    /// ISO 639-1 code of the transcript language, if known.
    pub language: Option<String>,
    /// Size of the audio sent for transcription.
    pub audio_size_mb: f64,
    pub chunk_count: usize,
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a batch of documents. Returns the number stored.
    async fn add_documents(&self, docs: &[Document]) -> Result<usize>;

    /// The `k` chunks of a video most similar to the query, best first.
    async fn similarity_search_with_scores(
        &self,
        video_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Like [`similarity_search_with_scores`](Self::similarity_search_with_scores) without scores.
    async fn similarity_search(
        &self,
        video_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Document>> {
        Ok(self
            .similarity_search_with_scores(video_key, query_embedding, k)
            .await?
            .into_iter()
            .map(|r| r.document)
            .collect())
    }

    /// All chunks of a video in transcript order.
    async fn documents(&self, video_key: &str) -> Result<Vec<Document>>;

    /// Number of chunks stored for a video.
    async fn count(&self, video_key: &str) -> Result<usize>;

    /// Delete a video's chunks and record. Returns the number of chunks removed.
    async fn delete_video(&self, video_key: &str) -> Result<usize>;

    /// Whether a video has been fully processed.
    async fn is_indexed(&self, video_key: &str) -> Result<bool> {
        Ok(self.get_video(video_key).await?.is_some())
    }

    /// Insert or replace a video record.
    async fn save_video(&self, record: &VideoRecord) -> Result<()>;

    /// Swap everything stored for a video for new chunks and a new record.
    ///
    /// Returns the number of chunks stored. Stores that can should apply
    /// this atomically so a failed write leaves the previous index intact.
    async fn replace_video(&self, record: &VideoRecord, docs: &[Document]) -> Result<usize> {
        self.delete_video(&record.video_key).await?;
        let stored = self.add_documents(docs).await?;
        self.save_video(record).await?;
        Ok(stored)
    }

    async fn get_video(&self, video_key: &str) -> Result<Option<VideoRecord>>;

    /// All processed videos, most recent first.
    async fn list_videos(&self) -> Result<Vec<VideoRecord>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score documents against a query and keep the best `k`.
pub(crate) fn rank(docs: Vec<Document>, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|doc| {
            let score = cosine_similarity(query_embedding, &doc.embedding);
            SearchResult {
                document: doc,
                score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.document.chunk_index.cmp(&b.document.chunk_index))
    });
    results.truncate(k);
    results
}
