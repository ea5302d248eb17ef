//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and cosine similarity is
//! computed in Rust. Collections are per video, so a search only scans the
//! chunks of one video.

use super::{rank, Document, SearchResult, VectorStore, VideoRecord};
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    video_key TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_video_key ON documents(video_key, chunk_index);

CREATE TABLE IF NOT EXISTS videos (
    video_key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    duration_seconds REAL,
    transcript TEXT NOT NULL,
    language TEXT,
    audio_size_mb REAL NOT NULL,
    chunk_count INTEGER NOT NULL,
    indexed_at TEXT NOT NULL
);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AssistantError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let chunk_index: i64 = row.get(2)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).map_err(|e| corrupt_column(0, e))?,
            video_key: row.get(1)?,
            chunk_index: chunk_index.max(0) as usize,
            content: row.get(3)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
        })
    }

    fn row_to_video(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
        let chunk_count: i64 = row.get(7)?;
        let indexed_at_str: String = row.get(8)?;

        Ok(VideoRecord {
            video_key: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            duration_seconds: row.get(3)?,
            transcript: row.get(4)?,
            language: row.get(5)?,
            audio_size_mb: row.get(6)?,
            chunk_count: chunk_count.max(0) as usize,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| corrupt_column(8, e))?,
        })
    }

    fn load_documents(&self, video_key: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, video_key, chunk_index, content, embedding
            FROM documents
            WHERE video_key = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let docs = stmt
            .query_map(params![video_key], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(stored_row_error)?;
        Ok(docs)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn add_documents(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        insert_documents(&tx, docs)?;
        tx.commit()?;

        info!("Stored {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn similarity_search_with_scores(
        &self,
        video_key: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.load_documents(video_key)?;
        let results = rank(docs, query_embedding, k);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    async fn documents(&self, video_key: &str) -> Result<Vec<Document>> {
        self.load_documents(video_key)
    }

    async fn count(&self, video_key: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE video_key = ?1",
            params![video_key],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn delete_video(&self, video_key: &str) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM documents WHERE video_key = ?1",
            params![video_key],
        )?;
        tx.execute("DELETE FROM videos WHERE video_key = ?1", params![video_key])?;
        tx.commit()?;

        info!("Deleted {} documents for video {}", deleted, video_key);
        Ok(deleted)
    }

    #[instrument(skip(self, record), fields(video_key = %record.video_key))]
    async fn save_video(&self, record: &VideoRecord) -> Result<()> {
        let conn = self.lock()?;
        insert_video(&conn, record)
    }

    #[instrument(skip(self, record, docs), fields(video_key = %record.video_key, count = docs.len()))]
    async fn replace_video(&self, record: &VideoRecord, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM documents WHERE video_key = ?1",
            params![record.video_key],
        )?;
        insert_documents(&tx, docs)?;
        insert_video(&tx, record)?;
        tx.commit()?;

        info!(
            "Replaced {} documents with {} for video {}",
            deleted,
            docs.len(),
            record.video_key
        );
        Ok(docs.len())
    }

    async fn get_video(&self, video_key: &str) -> Result<Option<VideoRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                r#"
                SELECT video_key, url, title, duration_seconds, transcript, language,
                       audio_size_mb, chunk_count, indexed_at
                FROM videos
                WHERE video_key = ?1
                "#,
                params![video_key],
                Self::row_to_video,
            )
            .optional()
            .map_err(stored_row_error)?;
        Ok(record)
    }

    async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT video_key, url, title, duration_seconds, transcript, language,
                   audio_size_mb, chunk_count, indexed_at
            FROM videos
            ORDER BY indexed_at DESC
            "#,
        )?;

        let videos = stmt
            .query_map([], Self::row_to_video)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(stored_row_error)?;
        Ok(videos)
    }
}

fn insert_documents(conn: &Connection, docs: &[Document]) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT OR REPLACE INTO documents (id, video_key, chunk_index, content, embedding)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;

    for doc in docs {
        stmt.execute(params![
            doc.id.to_string(),
            doc.video_key,
            doc.chunk_index as i64,
            doc.content,
            SqliteVectorStore::embedding_to_bytes(&doc.embedding),
        ])?;
    }
    Ok(())
}

fn insert_video(conn: &Connection, record: &VideoRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO videos
        (video_key, url, title, duration_seconds, transcript, language,
         audio_size_mb, chunk_count, indexed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            record.video_key,
            record.url,
            record.title,
            record.duration_seconds,
            record.transcript,
            record.language,
            record.audio_size_mb,
            record.chunk_count as i64,
            record.indexed_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// A stored text value that does not parse as its column's type.
fn corrupt_column<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn stored_row_error(e: rusqlite::Error) -> AssistantError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
            AssistantError::VectorStore(format!("Corrupt value in column {}: {}", column, source))
        }
        other => AssistantError::Database(other),
    }
}
