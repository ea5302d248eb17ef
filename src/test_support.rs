//! Deterministic fakes for the trait seams, shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{AssistantError, Result};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::progress::{ProgressReporter, ProgressState};
use crate::transcription::{Transcriber, TranscriptionOutput};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded language-model call.
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub model: String,
    pub prompt: String,
    pub options: CompletionOptions,
}

type Responder = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

/// Language model whose replies come from a closure over (model, prompt).
pub struct FakeLlm {
    responder: Responder,
    calls: Mutex<Vec<LlmCall>>,
}

impl FakeLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with the same text.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Always fail.
    pub fn failing() -> Self {
        Self::new(|_, _| Err(AssistantError::Llm("model unavailable".into())))
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(LlmCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            options,
        });
        (self.responder)(model, prompt)
    }
}

/// Bag-of-words embedder: each lowercase word is hashed into a bucket.
pub struct FakeEmbedder {
    dimensions: usize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self { dimensions: 64 }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            let bucket = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % self.dimensions] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Transcriber that returns fixed text and counts calls.
pub struct FakeTranscriber {
    text: String,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> Result<TranscriptionOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranscriptionOutput::new(self.text.clone(), Some("en".into())))
    }
}

/// Transcriber that plays back queued results and records the files it was given.
#[derive(Default)]
pub struct ScriptedTranscriber {
    results: Mutex<VecDeque<Result<TranscriptionOutput>>>,
    paths: Mutex<Vec<PathBuf>>,
}

impl ScriptedTranscriber {
    pub fn new(results: Vec<Result<TranscriptionOutput>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionOutput> {
        self.paths.lock().unwrap().push(audio_path.to_path_buf());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::Transcription("no scripted result".into())))
    }
}

/// Write a stand-in for ffmpeg that puts a few bytes in its last argument.
///
/// Returns the executable's path for use as `MediaTools::ffmpeg`.
#[cfg(unix)]
pub fn fake_ffmpeg(dir: &Path) -> String {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"#!/bin/sh\nfor arg; do out=\"$arg\"; done\nprintf audio > \"$out\"\n")
            .unwrap();
        file.sync_all().unwrap();
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Progress reporter that keeps every update.
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressState>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<ProgressState> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<ProgressState> {
        self.updates.lock().unwrap().last().cloned()
    }
}

impl ProgressReporter for RecordingProgress {
    fn update(&self, step: &str, percent: f64, message: &str, remaining_seconds: Option<f64>) {
        self.updates
            .lock()
            .unwrap()
            .push(ProgressState::new(step, percent, message, remaining_seconds));
    }
}
