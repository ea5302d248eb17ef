//! Pipeline orchestration for yt-assistant.
//!
//! Coordinates download, compression, transcription, chunking, embedding and
//! storage, and serves questions, summaries and translations afterwards.

use crate::audio::{
    file_size_mb, select_bitrate, DurationLimit, MediaTools, ProcessingQuality,
};
use crate::cache::TranscriptCache;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{AssistantError, Result};
use crate::evaluation::Evaluator;
use crate::language::{normalize_language, LanguageProcessor};
use crate::llm::{LanguageModel, OpenAILanguageModel};
use crate::progress::ProgressReporter;
use crate::qa::{Answer, QuestionAnswerer};
use crate::source::{validate_url, video_key, VideoMetadata, YoutubeSource};
use crate::summarize::{SummaryLength, Summarizer};
use crate::text::TextSplitter;
use crate::transcription::{
    ParallelTranscriber, Transcriber, TranscriptionOutput, WhisperTranscriber,
};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore, VideoRecord};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How a video should be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessOptions {
    pub duration: DurationLimit,
    pub quality: ProcessingQuality,
    /// Reprocess even if the video is already stored.
    pub force: bool,
}

/// Outcome of processing a video.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedVideo {
    pub video_key: String,
    pub title: String,
    pub chunk_count: usize,
    /// Size of the audio sent for transcription; 0 when served from storage.
    pub audio_size_mb: f64,
    pub from_cache: bool,
}

/// Storage key for a URL, or the input itself when it is already a key.
pub fn resolve_key(input: &str) -> String {
    match validate_url(input) {
        Ok(_) => video_key(input),
        Err(_) => input.trim().to_string(),
    }
}

/// The main processing pipeline.
pub struct VideoProcessor {
    settings: Settings,
    prompts: Arc<Prompts>,
    tools: MediaTools,
    youtube: YoutubeSource,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    transcriber: Arc<dyn Transcriber>,
    cache: Arc<TranscriptCache>,
    max_concurrent: usize,
}

impl VideoProcessor {
    /// Create a processor backed by OpenAI and the SQLite store.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let tools = MediaTools::from_settings(&settings.audio);
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
            &settings.models.transcription_model,
            tools.clone(),
            settings.audio.max_upload_mb,
        )?);
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.models.embedding_model,
            settings.models.embedding_dimensions as usize,
        )?);
        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAILanguageModel::new()?);
        let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);

        Self::with_components(settings, prompts, store, embedder, llm, transcriber)
    }

    /// Create a processor with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        std::fs::create_dir_all(settings.temp_dir())?;
        let cache = Arc::new(TranscriptCache::new(&settings.cache_dir())?);
        let tools = MediaTools::from_settings(&settings.audio);
        let youtube = YoutubeSource::with_ytdlp(&settings.audio.ytdlp_path);
        let max_concurrent = settings.transcription.concurrency();

        Ok(Self {
            settings,
            prompts: Arc::new(prompts),
            tools,
            youtube,
            store,
            embedder,
            llm,
            transcriber,
            cache,
            max_concurrent,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set how many segments are transcribed at once (clamped to 1..=5).
    pub fn set_parallelization(&mut self, value: usize) {
        self.max_concurrent = value.clamp(1, 5);
    }

    pub fn parallelization(&self) -> usize {
        self.max_concurrent
    }

    /// Download, transcribe and index a video.
    #[instrument(skip(self, progress))]
    pub async fn process_video(
        &self,
        url: &str,
        options: ProcessOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessedVideo> {
        validate_url(url)?;
        let key = video_key(url);

        if !options.force {
            if let Some(record) = self.store.get_video(&key).await? {
                info!("Video {} is already processed, skipping", key);
                progress.update("Complete", 100.0, "Using existing database", None);
                return Ok(ProcessedVideo {
                    video_key: key,
                    title: record.title,
                    chunk_count: record.chunk_count,
                    audio_size_mb: 0.0,
                    from_cache: true,
                });
            }
        }

        progress.update("Metadata", 2.0, "Fetching video details", None);
        let mut metadata = match self.youtube.fetch_metadata(url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Could not fetch metadata, continuing without it: {}", e);
                VideoMetadata::placeholder(url)
            }
        };
        metadata.key = key.clone();
        metadata.url = url.to_string();

        let temp_root = self.settings.temp_dir();
        std::fs::create_dir_all(&temp_root)?;
        let work_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", key))
            .tempdir_in(&temp_root)?;

        progress.update("Downloading", 5.0, "Downloading audio", None);
        let downloaded = self
            .tools
            .download_audio(url, &key, work_dir.path())
            .await?;

        let full_duration = match metadata.duration_seconds {
            Some(d) if d > 0.0 => d,
            _ => self.tools.probe_duration(&downloaded).await?,
        };
        let bitrate = select_bitrate(full_duration, &self.settings.audio, options.quality);

        progress.update("Compressing", 20.0, &format!("Compressing audio at {}", bitrate), None);
        let compressed = work_dir.path().join(format!("{}_compressed.mp3", key));
        self.tools
            .compress_audio(&downloaded, &compressed, &bitrate)
            .await?;

        let (audio, duration) = match options.duration.seconds() {
            Some(limit) if limit < full_duration => {
                progress.update("Clipping", 30.0, &format!("Keeping the {}", options.duration), None);
                let clipped = work_dir.path().join(format!("{}_clipped.mp3", key));
                self.tools
                    .clip_audio(&compressed, &clipped, limit, &bitrate)
                    .await?;
                (clipped, limit)
            }
            _ => (compressed, full_duration),
        };

        let long_video = self.is_long_video(duration);

        progress.update("Transcribing", 35.0, "Transcribing audio", None);
        let (output, audio_size_mb) = self
            .transcribe(&audio, duration, &key, &bitrate, long_video, work_dir.path(), progress)
            .await?;

        let chunk_count = self
            .index_transcript(&metadata, &output, audio_size_mb, long_video, progress)
            .await?;

        progress.update("Complete", 100.0, &format!("Indexed {} chunks", chunk_count), None);
        progress.finish();

        Ok(ProcessedVideo {
            video_key: key,
            title: metadata.title,
            chunk_count,
            audio_size_mb,
            from_cache: false,
        })
    }

    /// Whether audio of this length is transcribed in segments.
    fn is_long_video(&self, duration: f64) -> bool {
        duration > f64::from(self.settings.audio.long_video_threshold_minutes) * 60.0
    }

    #[allow(clippy::too_many_arguments)]
    async fn transcribe(
        &self,
        audio: &Path,
        duration: f64,
        key: &str,
        bitrate: &str,
        long_video: bool,
        work_dir: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<(TranscriptionOutput, f64)> {
        let size_mb = file_size_mb(audio)?;
        let max_mb = self.settings.audio.max_upload_mb;

        if size_mb > f64::from(max_mb) {
            warn!("Compressed audio is {:.1}MB, over the {}MB limit", size_mb, max_mb);
            let trimmed = work_dir.join(format!("{}_trimmed.mp3", key));
            let upload = self
                .tools
                .trim_to_size_limit(audio, &trimmed, bitrate, max_mb)
                .await?;
            let output = self.transcriber.transcribe(&upload).await?;
            return Ok((output, file_size_mb(&upload)?));
        }

        if long_video {
            info!("Long video ({:.0} min), transcribing in segments", duration / 60.0);
            let parallel = ParallelTranscriber::new(
                self.transcriber.clone(),
                self.tools.clone(),
                self.cache.clone(),
                &self.settings.transcription,
            )
            .with_concurrency(self.max_concurrent);
            let output = parallel.transcribe(audio, duration, key, progress).await?;
            return Ok((output, size_mb));
        }

        let output = self.transcriber.transcribe(audio).await?;
        Ok((output, size_mb))
    }

    /// Chunk, embed and store a transcript, replacing anything stored for the video.
    #[instrument(skip(self, metadata, transcript, progress), fields(key = %metadata.key))]
    pub async fn index_transcript(
        &self,
        metadata: &VideoMetadata,
        transcript: &TranscriptionOutput,
        audio_size_mb: f64,
        long_video: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<usize> {
        let chunking = &self.settings.chunking;
        let overlap = if long_video {
            chunking.long_video_overlap
        } else {
            chunking.chunk_overlap
        };
        let splitter = TextSplitter::new(chunking.chunk_size, overlap)?;

        progress.update("Indexing", 85.0, "Splitting transcript", None);
        let chunks = splitter.split(&transcript.text);
        if chunks.is_empty() {
            return Err(AssistantError::Transcription(
                "Transcription produced no text".into(),
            ));
        }

        progress.update(
            "Indexing",
            90.0,
            &format!("Embedding {} chunks", chunks.len()),
            None,
        );
        let embeddings = self.embedder.embed_batch(&chunks).await?;
        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| Document::new(&metadata.key, i, content, embedding))
            .collect();

        let language = match transcript.language.as_deref() {
            Some(reported) => Some(
                normalize_language(reported)
                    .map(str::to_string)
                    .unwrap_or_else(|| reported.to_lowercase()),
            ),
            None => {
                let detected = self
                    .language_processor()
                    .detect_language(&transcript.text)
                    .await;
                (detected.code != "unknown").then(|| detected.code.to_string())
            }
        };

        let record = VideoRecord {
            video_key: metadata.key.clone(),
            url: metadata.url.clone(),
            title: metadata.title.clone(),
            duration_seconds: metadata.duration_seconds,
            transcript: transcript.text.clone(),
            language,
            audio_size_mb,
            chunk_count: documents.len(),
            indexed_at: Utc::now(),
        };
        let stored = self.store.replace_video(&record, &documents).await?;

        info!("Indexed {} chunks for {}", stored, metadata.key);
        Ok(stored)
    }

    fn question_answerer(&self) -> QuestionAnswerer {
        QuestionAnswerer::new(
            self.store.clone(),
            self.embedder.clone(),
            self.llm.clone(),
            self.prompts.clone(),
        )
    }

    /// Answer a question, falling back to a short answer with the default model.
    pub async fn answer_question(
        &self,
        key: &str,
        question: &str,
        k: usize,
        model: Option<&str>,
    ) -> Result<Answer> {
        let default_model = self.settings.models.qa_model.as_str();
        let qa = self.question_answerer();

        match qa.answer(key, question, k, model.unwrap_or(default_model)).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!("Standard QA failed, falling back to simple answer: {}", e);
                qa.simple_answer(key, question, default_model).await
            }
        }
    }

    /// Summarize a video, retrying once with the default model and a brief length.
    pub async fn summarize_video(
        &self,
        key: &str,
        model: Option<&str>,
        length: SummaryLength,
    ) -> Result<String> {
        let default_model = self.settings.models.summary_model.as_str();
        let summarizer = Summarizer::new(
            self.store.clone(),
            self.embedder.clone(),
            self.llm.clone(),
            self.prompts.clone(),
        );

        match summarizer
            .summarize(key, model.unwrap_or(default_model), length)
            .await
        {
            Ok(summary) => Ok(summary),
            Err(e @ AssistantError::VideoNotFound(_)) => Err(e),
            Err(e) => {
                warn!("Summary failed, retrying with {} (brief): {}", default_model, e);
                summarizer
                    .summarize(key, default_model, SummaryLength::Brief)
                    .await
            }
        }
    }

    /// Stored record (with transcript) of a processed video.
    pub async fn transcript(&self, key: &str) -> Result<VideoRecord> {
        self.store
            .get_video(key)
            .await?
            .ok_or_else(|| AssistantError::VideoNotFound(key.to_string()))
    }

    /// Translate a stored transcript to `target`.
    pub async fn translate_transcript(&self, key: &str, target: &str) -> Result<String> {
        let record = self.transcript(key).await?;
        Ok(self
            .language_processor()
            .translate_text(&record.transcript, target)
            .await)
    }

    pub fn language_processor(&self) -> LanguageProcessor {
        LanguageProcessor::new(
            self.llm.clone(),
            self.prompts.clone(),
            &self.settings.models.translation_model,
        )
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(
            self.llm.clone(),
            self.prompts.clone(),
            &self.settings.models.evaluation_model,
        )
    }

    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        self.store.list_videos().await
    }

    /// Remove a video's chunks, record and cached segments.
    pub async fn remove_video(&self, key: &str) -> Result<usize> {
        let known = self.store.get_video(key).await?.is_some();
        let removed = self.store.delete_video(key).await?;
        let segments = self.cache.clear(key)?;

        if !known && removed == 0 && segments == 0 {
            return Err(AssistantError::VideoNotFound(key.to_string()));
        }

        info!("Removed {} chunks and {} cached segments for {}", removed, segments, key);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionOptions;
    use crate::progress::NoopProgress;
    use crate::test_support::{
        FakeEmbedder, FakeLlm, FakeTranscriber, RecordingProgress, ScriptedTranscriber,
    };
    use crate::vector_store::MemoryVectorStore;
    use tempfile::TempDir;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        settings.general.data_dir = path("data");
        settings.general.temp_dir = path("tmp");
        settings.general.cache_dir = path("cache");
        settings.audio.ffmpeg_path = path("missing-ffmpeg");
        settings.audio.ffprobe_path = path("missing-ffprobe");
        settings.audio.ytdlp_path = path("missing-yt-dlp");
        settings.chunking.chunk_size = 40;
        settings.chunking.chunk_overlap = 10;
        settings.chunking.long_video_overlap = 5;
        settings
    }

    fn processor(dir: &TempDir, llm: Arc<FakeLlm>) -> (VideoProcessor, Arc<MemoryVectorStore>) {
        let store = Arc::new(MemoryVectorStore::new());
        let processor = VideoProcessor::with_components(
            settings(dir),
            Prompts::default(),
            store.clone(),
            Arc::new(FakeEmbedder::new()),
            llm,
            Arc::new(FakeTranscriber::new("unused")),
        )
        .unwrap();
        (processor, store)
    }

    /// Processor whose ffmpeg is `true`, so every ffmpeg step succeeds without output.
    #[cfg(unix)]
    fn transcribing_processor(
        dir: &TempDir,
        transcriber: Arc<ScriptedTranscriber>,
        max_upload_mb: u32,
    ) -> VideoProcessor {
        let mut settings = settings(dir);
        settings.audio.ffmpeg_path = "true".to_string();
        settings.audio.max_upload_mb = max_upload_mb;
        VideoProcessor::with_components(
            settings,
            Prompts::default(),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(FakeEmbedder::new()),
            Arc::new(FakeLlm::replying("ok")),
            transcriber,
        )
        .unwrap()
    }

    fn part(text: &str) -> Result<TranscriptionOutput> {
        Ok(TranscriptionOutput::new(text, Some("en".into())))
    }

    fn metadata() -> VideoMetadata {
        let mut metadata = VideoMetadata::placeholder(URL);
        metadata.title = "Never Gonna Give You Up".to_string();
        metadata
    }

    async fn index(processor: &VideoProcessor, text: &str) -> usize {
        let transcript = TranscriptionOutput::new(text, Some("english".into()));
        processor
            .index_transcript(&metadata(), &transcript, 1.5, false, &NoopProgress)
            .await
            .unwrap()
    }

    #[test]
    fn test_resolve_key() {
        assert_eq!(resolve_key(URL), "dQw4w9WgXcQ");
        assert_eq!(resolve_key(" dQw4w9WgXcQ "), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_set_parallelization_clamps() {
        let dir = TempDir::new().unwrap();
        let (mut processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        assert_eq!(processor.parallelization(), 3);

        processor.set_parallelization(0);
        assert_eq!(processor.parallelization(), 1);
        processor.set_parallelization(12);
        assert_eq!(processor.parallelization(), 5);
    }

    #[test]
    fn test_long_video_threshold() {
        let dir = TempDir::new().unwrap();
        let (processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        let threshold = f64::from(processor.settings().audio.long_video_threshold_minutes) * 60.0;

        assert!(!processor.is_long_video(threshold - 1.0));
        assert!(!processor.is_long_video(threshold));
        assert!(processor.is_long_video(threshold + 1.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_short_audio_single_request() {
        let dir = TempDir::new().unwrap();
        let transcriber = Arc::new(ScriptedTranscriber::new(vec![part("short talk")]));
        let processor = transcribing_processor(&dir, transcriber.clone(), 25);

        let audio = dir.path().join("vid.mp3");
        std::fs::write(&audio, vec![0u8; 1024]).unwrap();

        let (output, _) = processor
            .transcribe(&audio, 300.0, "vid", "32k", false, dir.path(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(output.text, "short talk");
        assert_eq!(transcriber.paths(), vec![audio]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_oversized_audio_is_trimmed_before_upload() {
        let dir = TempDir::new().unwrap();
        let transcriber = Arc::new(ScriptedTranscriber::new(vec![part("trimmed talk")]));
        let processor = transcribing_processor(&dir, transcriber.clone(), 1);

        let audio = dir.path().join("vid.mp3");
        std::fs::write(&audio, vec![0u8; 1536 * 1024]).unwrap();
        // Stand-in ffmpeg writes nothing, so the clip target is prepared here
        let trimmed = dir.path().join("vid_trimmed.mp3");
        std::fs::write(&trimmed, vec![0u8; 512 * 1024]).unwrap();

        let (output, size_mb) = processor
            .transcribe(&audio, 7200.0, "vid", "32k", true, dir.path(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(output.text, "trimmed talk");
        assert_eq!(transcriber.paths(), vec![trimmed]);
        assert!((size_mb - 0.5).abs() < 0.01);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_long_audio_transcribed_in_segments() {
        let dir = TempDir::new().unwrap();
        let transcriber = Arc::new(ScriptedTranscriber::new(vec![
            part("part"),
            part("part"),
            part("part"),
        ]));
        let processor = transcribing_processor(&dir, transcriber.clone(), 25);

        let audio = dir.path().join("vid.mp3");
        std::fs::write(&audio, vec![0u8; 1024]).unwrap();

        let (output, _) = processor
            .transcribe(&audio, 1500.0, "vid", "32k", true, dir.path(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(output.text, "part part part");
        let paths = transcriber.paths();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.to_string_lossy().contains("vid_segment_")));
        assert!(processor.cache.is_fully_cached("vid", 3).unwrap());
    }

    #[tokio::test]
    async fn test_index_transcript() {
        let dir = TempDir::new().unwrap();
        let (processor, store) = processor(&dir, Arc::new(FakeLlm::replying("ok")));

        let text = "The quick brown fox jumps over the lazy dog. ".repeat(5);
        let count = index(&processor, &text).await;
        assert!(count > 1);
        assert_eq!(store.count("dQw4w9WgXcQ").await.unwrap(), count);

        let record = processor.transcript("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(record.chunk_count, count);
        assert_eq!(record.language.as_deref(), Some("en"));
        assert_eq!(record.audio_size_mb, 1.5);
        assert_eq!(record.transcript, text);

        // Reindexing replaces the previous chunks
        let count = index(&processor, "short text").await;
        assert_eq!(count, 1);
        assert_eq!(store.count("dQw4w9WgXcQ").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_detects_missing_language() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::replying("fr"));
        let (processor, _) = processor(&dir, llm.clone());

        let transcript = TranscriptionOutput::new("Bonjour tout le monde", None);
        processor
            .index_transcript(&metadata(), &transcript, 0.5, false, &NoopProgress)
            .await
            .unwrap();

        let record = processor.transcript("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(record.language.as_deref(), Some("fr"));
        assert_eq!(llm.calls()[0].model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_index_empty_transcript_fails() {
        let dir = TempDir::new().unwrap();
        let (processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        let transcript = TranscriptionOutput::new("   ", Some("en".into()));

        let result = processor
            .index_transcript(&metadata(), &transcript, 0.0, false, &NoopProgress)
            .await;
        assert!(matches!(result, Err(AssistantError::Transcription(_))));
    }

    #[tokio::test]
    async fn test_process_video_uses_stored_video() {
        let dir = TempDir::new().unwrap();
        let (processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        let count = index(&processor, "already processed transcript").await;

        // The tool paths do not exist, so any download attempt would fail
        let progress = RecordingProgress::default();
        let result = processor
            .process_video(URL, ProcessOptions::default(), &progress)
            .await
            .unwrap();

        assert!(result.from_cache);
        assert_eq!(result.audio_size_mb, 0.0);
        assert_eq!(result.chunk_count, count);
        assert_eq!(result.title, "Never Gonna Give You Up");
        assert_eq!(progress.last().unwrap().percent, 100.0);
    }

    #[tokio::test]
    async fn test_process_video_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let (processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));

        let result = processor
            .process_video("https://vimeo.com/123", ProcessOptions::default(), &NoopProgress)
            .await;
        assert!(matches!(result, Err(AssistantError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_process_video_reports_missing_tools() {
        let dir = TempDir::new().unwrap();
        let (processor, _) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        let options = ProcessOptions {
            force: true,
            ..Default::default()
        };

        let result = processor.process_video(URL, options, &NoopProgress).await;
        assert!(matches!(result, Err(AssistantError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_answer_falls_back_to_simple_answer() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(|_, prompt| {
            if prompt.contains("By searching the following video transcript") {
                Err(AssistantError::Llm("context too long".into()))
            } else {
                Ok("Simple answer".to_string())
            }
        }));
        let (processor, _) = processor(&dir, llm.clone());
        index(&processor, "rust ownership and borrowing explained").await;

        let answer = processor
            .answer_question("dQw4w9WgXcQ", "What is ownership?", 2, Some("gpt-4"))
            .await
            .unwrap();
        assert_eq!(answer.text, "Simple answer");

        let calls = llm.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "gpt-4");
        assert_eq!(calls[1].model, "gpt-3.5-turbo-instruct");
        assert_eq!(calls[1].options, CompletionOptions::new(300, 0.0));
    }

    #[tokio::test]
    async fn test_summary_retries_with_default_model() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::new(|model, _| {
            if model == "broken-model" {
                Err(AssistantError::Llm("unknown model".into()))
            } else {
                Ok("A short summary.".to_string())
            }
        }));
        let (processor, _) = processor(&dir, llm.clone());
        index(&processor, "a talk about rust and its borrow checker").await;

        let summary = processor
            .summarize_video("dQw4w9WgXcQ", Some("broken-model"), SummaryLength::Detailed)
            .await
            .unwrap();
        assert_eq!(summary, "A short summary.");

        let last = llm.calls().pop().unwrap();
        assert_eq!(last.model, "gpt-3.5-turbo-instruct");
        assert_eq!(last.options.max_tokens, 250);
    }

    #[tokio::test]
    async fn test_summary_of_unknown_video() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::replying("unused"));
        let (processor, _) = processor(&dir, llm.clone());

        let result = processor
            .summarize_video("nothing", None, SummaryLength::Moderate)
            .await;
        assert!(matches!(result, Err(AssistantError::VideoNotFound(_))));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_translate_transcript() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(FakeLlm::replying("Hola mundo"));
        let (processor, _) = processor(&dir, llm.clone());
        index(&processor, "hello world").await;

        let translated = processor
            .translate_transcript("dQw4w9WgXcQ", "es")
            .await
            .unwrap();
        assert_eq!(translated, "Hola mundo");
        assert!(llm.calls()[0].prompt.contains("Spanish"));

        let missing = processor.translate_transcript("other", "es").await;
        assert!(matches!(missing, Err(AssistantError::VideoNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let dir = TempDir::new().unwrap();
        let (processor, store) = processor(&dir, Arc::new(FakeLlm::replying("ok")));
        index(&processor, "some transcript text").await;
        processor
            .cache
            .save_segment("dQw4w9WgXcQ", 0, 0.0, 600.0, "segment text")
            .unwrap();

        assert_eq!(processor.list_videos().await.unwrap().len(), 1);

        let removed = processor.remove_video("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(removed, 1);
        assert!(processor.list_videos().await.unwrap().is_empty());
        assert_eq!(store.count("dQw4w9WgXcQ").await.unwrap(), 0);
        assert!(processor.cache.cached_segments("dQw4w9WgXcQ").unwrap().is_empty());

        let again = processor.remove_video("dQw4w9WgXcQ").await;
        assert!(matches!(again, Err(AssistantError::VideoNotFound(_))));
    }
}
