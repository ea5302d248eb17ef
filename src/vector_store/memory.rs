//! In-memory vector store implementation.
//!
//! Useful for testing and one-off runs.

use super::{rank, Document, SearchResult, VectorStore, VideoRecord};
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Vec<Document>>,
    videos: HashMap<String, VideoRecord>,
}

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryVectorStore {
    inner: RwLock<Inner>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| AssistantError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| AssistantError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_documents(&self, docs: &[Document]) -> Result<usize> {
        let mut inner = self.write()?;
        for doc in docs {
            inner
                .documents
                .entry(doc.video_key.clone())
                .or_default()
                .push(doc.clone());
        }
        Ok(docs.len())
    }

    async fn similarity_search_with_scores(
        &self,
        video_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self
            .read()?
            .documents
            .get(video_key)
            .cloned()
            .unwrap_or_default();
        Ok(rank(docs, query_embedding, k))
    }

    async fn documents(&self, video_key: &str) -> Result<Vec<Document>> {
        let mut docs = self
            .read()?
            .documents
            .get(video_key)
            .cloned()
            .unwrap_or_default();
        docs.sort_by_key(|d| d.chunk_index);
        Ok(docs)
    }

    async fn count(&self, video_key: &str) -> Result<usize> {
        Ok(self
            .read()?
            .documents
            .get(video_key)
            .map(Vec::len)
            .unwrap_or(0))
    }

    async fn delete_video(&self, video_key: &str) -> Result<usize> {
        let mut inner = self.write()?;
        inner.videos.remove(video_key);
        Ok(inner
            .documents
            .remove(video_key)
            .map(|docs| docs.len())
            .unwrap_or(0))
    }

    async fn save_video(&self, record: &VideoRecord) -> Result<()> {
        self.write()?
            .videos
            .insert(record.video_key.clone(), record.clone());
        Ok(())
    }

    async fn get_video(&self, video_key: &str) -> Result<Option<VideoRecord>> {
        Ok(self.read()?.videos.get(video_key).cloned())
    }

    async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        let mut videos: Vec<VideoRecord> = self.read()?.videos.values().cloned().collect();
        videos.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(videos)
    }
}
