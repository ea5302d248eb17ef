//! On-disk cache of per-segment transcriptions.
//!
//! Long videos are transcribed in segments. Each finished segment is written
//! as its own JSON file so an interrupted run can resume where it stopped.
//! A small metadata file per video tracks which segments are present.

use crate::error::{AssistantError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A cached transcription of one audio segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSegment {
    pub segment: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub transcript: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-video index of cached segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMetadata {
    video_id: String,
    segments: Vec<usize>,
    last_updated: DateTime<Utc>,
    segments_completed: usize,
}

/// Segment transcription cache rooted at a directory.
pub struct TranscriptCache {
    dir: PathBuf,
}

impl TranscriptCache {
    /// Open a cache, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn segment_path(&self, key: &str, segment: usize) -> PathBuf {
        self.dir.join(format!("{}_segment_{}.json", key, segment))
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_metadata.json", key))
    }

    /// Store the transcript of one segment.
    pub fn save_segment(
        &self,
        key: &str,
        segment: usize,
        start_time: f64,
        end_time: f64,
        transcript: &str,
    ) -> Result<()> {
        let record = CachedSegment {
            segment,
            start_time,
            end_time,
            transcript: transcript.to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(self.segment_path(key, segment), json).map_err(|e| {
            AssistantError::Cache(format!("Failed to write segment {}: {}", segment, e))
        })?;

        // Index update is best-effort
        if let Err(e) = self.record_segment(key, segment) {
            warn!("Failed to update cache metadata for {}: {}", key, e);
        }

        debug!("Cached segment {} for {}", segment, key);
        Ok(())
    }

    fn read_metadata(&self, key: &str) -> Option<CacheMetadata> {
        let content = std::fs::read_to_string(self.metadata_path(key)).ok()?;
        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Ignoring unreadable cache metadata for {}: {}", key, e);
                None
            }
        }
    }

    fn record_segment(&self, key: &str, segment: usize) -> Result<()> {
        let mut segments: BTreeSet<usize> = self
            .read_metadata(key)
            .map(|m| m.segments.into_iter().collect())
            .unwrap_or_default();
        segments.insert(segment);

        let metadata = CacheMetadata {
            video_id: key.to_string(),
            segments_completed: segments.len(),
            segments: segments.into_iter().collect(),
            last_updated: Utc::now(),
        };

        std::fs::write(
            self.metadata_path(key),
            serde_json::to_string_pretty(&metadata)?,
        )?;
        Ok(())
    }

    /// All cached segments for a video, ordered by segment index.
    pub fn cached_segments(&self, key: &str) -> Result<Vec<CachedSegment>> {
        let Some(metadata) = self.read_metadata(key) else {
            return Ok(Vec::new());
        };

        let mut segments = Vec::with_capacity(metadata.segments.len());
        for index in metadata.segments {
            let path = self.segment_path(key, index);
            if !path.exists() {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<CachedSegment>(&content) {
                Ok(segment) => segments.push(segment),
                Err(e) => warn!("Skipping corrupt cache file {:?}: {}", path, e),
            }
        }

        segments.sort_by_key(|s| s.segment);
        Ok(segments)
    }

    /// Indices of the segments already cached.
    pub fn cached_indices(&self, key: &str) -> Result<BTreeSet<usize>> {
        Ok(self
            .cached_segments(key)?
            .into_iter()
            .map(|s| s.segment)
            .collect())
    }

    /// Join all cached transcripts in segment order.
    pub fn combine_transcripts(&self, key: &str) -> Result<Option<String>> {
        let segments = self.cached_segments(key)?;
        if segments.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            segments
                .iter()
                .map(|s| s.transcript.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        ))
    }

    /// Whether exactly the segments `0..total` are cached.
    pub fn is_fully_cached(&self, key: &str, total: usize) -> Result<bool> {
        let expected: BTreeSet<usize> = (0..total).collect();
        Ok(self.cached_indices(key)? == expected)
    }

    /// Remove every cache file for a video. Returns the number of files removed.
    pub fn clear(&self, key: &str) -> Result<usize> {
        let segment_prefix = format!("{}_segment_", key);
        let metadata_name = format!("{}_metadata.json", key);
        let mut removed = 0;

        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == metadata_name || (name.starts_with(&segment_prefix) && name.ends_with(".json")) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Cleared {} cache files for {}", removed, key);
        }
        Ok(removed)
    }
}
