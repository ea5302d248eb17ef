//! Segmented, concurrent transcription of long audio.

use super::{Transcriber, TranscriptionOutput};
use crate::audio::{segment_plan, AudioSegment, MediaTools};
use crate::cache::TranscriptCache;
use crate::config::TranscriptionSettings;
use crate::error::{AssistantError, Result};
use crate::progress::ProgressReporter;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const STEP: &str = "Transcribing";

/// Transcribes long audio in fixed-length segments with bounded concurrency.
pub struct ParallelTranscriber {
    transcriber: Arc<dyn Transcriber>,
    tools: MediaTools,
    cache: Arc<TranscriptCache>,
    segment_seconds: f64,
    segment_bitrate: String,
    max_concurrent: usize,
}

impl ParallelTranscriber {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        tools: MediaTools,
        cache: Arc<TranscriptCache>,
        settings: &TranscriptionSettings,
    ) -> Self {
        Self {
            transcriber,
            tools,
            cache,
            segment_seconds: f64::from(settings.segment_minutes.max(1)) * 60.0,
            segment_bitrate: settings.segment_bitrate.clone(),
            max_concurrent: settings.concurrency(),
        }
    }

    /// Override the number of segments transcribed at once (clamped to 1..=5).
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.clamp(1, 5);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Transcribe `duration` seconds of audio stored under `key`.
    ///
    /// Segments already in the cache are not re-sent. Each new success is cached
    /// as soon as it arrives; if any segment fails the error lists the failures
    /// and the successful segments remain cached for the next attempt.
    #[instrument(skip(self, progress), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        duration: f64,
        key: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<TranscriptionOutput> {
        let plan = segment_plan(duration, self.segment_seconds);
        if plan.is_empty() {
            return Err(AssistantError::AudioProcessing(format!(
                "Cannot segment audio with duration {:.1}s",
                duration
            )));
        }
        let total = plan.len();

        if self.cache.is_fully_cached(key, total)? {
            info!("All {} segments cached for {}", total, key);
            progress.update(STEP, 100.0, "Using cached transcription", None);
            return self.combined(key, None);
        }

        let cached = self.cache.cached_indices(key)?;
        let work_dir = tempfile::tempdir()?;
        let pending: Vec<AudioSegment> = plan
            .into_iter()
            .filter(|(index, _, _)| !cached.contains(index))
            .map(|(index, start, end)| AudioSegment {
                index,
                path: work_dir.path().join(format!("{}_segment_{:04}.mp3", key, index)),
                start_seconds: start,
                end_seconds: end,
            })
            .collect();

        info!(
            "Transcribing {} of {} segments ({} cached, {} at a time)",
            pending.len(),
            total,
            cached.len(),
            self.max_concurrent
        );

        let pending_count = pending.len();
        let started = Instant::now();
        let mut completed = cached.len();
        let mut finished_here = 0usize;
        let mut failures: Vec<(usize, String)> = Vec::new();
        let mut language: Option<String> = None;

        progress.update(
            STEP,
            percent(completed, total),
            &format!("Segment {}/{}", completed, total),
            None,
        );

        let mut results = stream::iter(pending)
            .map(|segment| async move {
                let result = self.transcribe_segment(audio_path, &segment).await;
                (segment, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((segment, result)) = results.next().await {
            finished_here += 1;

            match result {
                Ok(output) => {
                    if let Err(e) = self.cache.save_segment(
                        key,
                        segment.index,
                        segment.start_seconds,
                        segment.end_seconds,
                        &output.text,
                    ) {
                        warn!("Segment {} transcribed but not cached: {}", segment.index, e);
                        failures.push((segment.index, e.to_string()));
                    } else {
                        if language.is_none() {
                            language = output.language;
                        }
                        completed += 1;
                    }
                }
                Err(e) => {
                    warn!("Segment {} failed: {}", segment.index, e);
                    failures.push((segment.index, e.to_string()));
                }
            }

            let elapsed = started.elapsed().as_secs_f64();
            let remaining = (pending_count - finished_here) as f64 * elapsed / finished_here as f64;
            progress.update(
                STEP,
                percent(completed, total),
                &format!("Segment {}/{}", completed, total),
                Some(remaining),
            );
        }

        if !failures.is_empty() {
            failures.sort_by_key(|(index, _)| *index);
            let details: Vec<String> = failures
                .iter()
                .map(|(index, error)| format!("segment {}: {}", index, error))
                .collect();
            return Err(AssistantError::Transcription(format!(
                "{} of {} segments failed ({} cached for retry): {}",
                failures.len(),
                total,
                completed,
                details.join("; ")
            )));
        }

        self.combined(key, language)
    }

    async fn transcribe_segment(
        &self,
        audio_path: &Path,
        segment: &AudioSegment,
    ) -> Result<TranscriptionOutput> {
        self.tools
            .extract_segment(audio_path, segment, &self.segment_bitrate)
            .await?;
        debug!(
            "Extracted segment {} ({:.0}s-{:.0}s)",
            segment.index, segment.start_seconds, segment.end_seconds
        );

        let result = self.transcriber.transcribe(&segment.path).await;
        let _ = std::fs::remove_file(&segment.path);
        result
    }

    fn combined(&self, key: &str, language: Option<String>) -> Result<TranscriptionOutput> {
        self.cache
            .combine_transcripts(key)?
            .map(|text| TranscriptionOutput::new(text, language))
            .ok_or_else(|| AssistantError::Transcription("No segments were transcribed".into()))
    }
}

fn percent(done: usize, total: usize) -> f64 {
    done as f64 / total as f64 * 100.0
}
