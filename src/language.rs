//! Language detection and translation of transcripts.

use crate::config::Prompts;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::text::{char_len, take_chars};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Longest text sent to the model in one translation request.
pub const MAX_TRANSLATION_CHARS: usize = 4000;
/// Marker placed between segments translated in a single request.
pub const SEGMENT_BREAK: &str = "\n---SEGMENT BREAK---\n";

const DETECTION_SAMPLE_CHARS: usize = 1000;

const LANGUAGES: [(&str, &str); 21] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("fi", "Finnish"),
    ("no", "Norwegian"),
    ("da", "Danish"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
];

/// A language by ISO 639-1 code and English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

impl Language {
    pub const UNKNOWN: Language = Language {
        code: "unknown",
        name: "Unknown",
    };
}

/// All supported languages, sorted by name.
pub fn supported_languages() -> Vec<Language> {
    let mut languages: Vec<Language> = LANGUAGES
        .iter()
        .map(|&(code, name)| Language { code, name })
        .collect();
    languages.sort_by_key(|l| l.name);
    languages
}

/// English name for a supported language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Map a code or a language name (as reported by Whisper, e.g. "english") to its code.
pub fn normalize_language(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(code, name)| *code == input || name.to_lowercase() == input)
        .map(|(code, _)| *code)
}

/// Split text into pieces of at most `max_chars`, preferring paragraph
/// boundaries and falling back to sentences for long paragraphs.
///
/// A single sentence longer than `max_chars` becomes its own piece.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    fn push(chunks: &mut Vec<String>, chunk: String) {
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        if char_len(&current) + char_len(para) > max_chars {
            push(&mut chunks, std::mem::take(&mut current));

            if char_len(para) > max_chars {
                let mut sentences = String::new();
                for sentence in para.split(". ") {
                    if char_len(&sentences) + char_len(sentence) + 2 > max_chars {
                        push(&mut chunks, std::mem::take(&mut sentences));
                    }
                    sentences.push_str(sentence);
                    sentences.push_str(". ");
                }
                current = sentences;
            } else {
                current = para.to_string();
            }
        } else if current.is_empty() {
            current = para.to_string();
        } else {
            current.push_str("\n\n");
            current.push_str(para);
        }
    }

    push(&mut chunks, current);
    chunks
}

/// Detects and translates text with a language model.
pub struct LanguageProcessor {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    model: String,
}

impl LanguageProcessor {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, model: &str) -> Self {
        Self {
            llm,
            prompts,
            model: model.to_string(),
        }
    }

    /// Detect the language of `text` from its first 1000 characters.
    #[instrument(skip(self, text))]
    pub async fn detect_language(&self, text: &str) -> Language {
        let sample = take_chars(text.trim(), DETECTION_SAMPLE_CHARS);
        if sample.is_empty() {
            return Language::UNKNOWN;
        }

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.translation.detect, &[("text", sample)]);

        match self
            .llm
            .complete(&self.model, &prompt, CompletionOptions::new(10, 0.0))
            .await
        {
            Ok(reply) => {
                let code = reply
                    .trim()
                    .trim_matches(|c: char| !c.is_alphabetic())
                    .to_lowercase();
                match normalize_language(&code) {
                    Some(code) => Language {
                        code,
                        name: language_name(code).unwrap_or("Unknown"),
                    },
                    None => {
                        debug!("Unrecognized language reply: {}", reply);
                        Language::UNKNOWN
                    }
                }
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                Language::UNKNOWN
            }
        }
    }

    /// Translate `text` to `target` (a code or a language name).
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn translate_text(&self, text: &str, target: &str) -> String {
        let language = language_name(target).unwrap_or(target);

        if char_len(text) <= MAX_TRANSLATION_CHARS {
            return self.translate_chunk(text, language).await;
        }

        let chunks = split_text(text, MAX_TRANSLATION_CHARS);
        info!("Translating {} chunks to {}", chunks.len(), language);

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.translate_chunk(chunk, language).await);
        }
        translated.join(" ")
    }

    /// Translate several segments, in one request when the model keeps the
    /// segment markers intact and one by one otherwise.
    pub async fn translate_segments(&self, segments: &[String], target: &str) -> Vec<String> {
        if segments.is_empty() {
            return Vec::new();
        }

        let combined = segments.join(SEGMENT_BREAK);
        let translated = self.translate_text(&combined, target).await;
        let parts: Vec<String> = translated
            .split(SEGMENT_BREAK)
            .map(str::to_string)
            .collect();

        if parts.len() == segments.len() {
            return parts;
        }

        warn!(
            "Expected {} translated segments, got {}; translating individually",
            segments.len(),
            parts.len()
        );
        let mut result = Vec::with_capacity(segments.len());
        for segment in segments {
            result.push(self.translate_text(segment, target).await);
        }
        result
    }

    async fn translate_chunk(&self, text: &str, language: &str) -> String {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.translation.translate,
            &[("language", language), ("text", text)],
        );

        match self
            .llm
            .complete(&self.model, &prompt, CompletionOptions::new(4000, 0.3))
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation error, keeping original text: {}", e);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::test_support::FakeLlm;

    fn processor(llm: Arc<FakeLlm>) -> LanguageProcessor {
        LanguageProcessor::new(llm, Arc::new(Prompts::default()), "gpt-3.5-turbo")
    }

    #[test]
    fn test_supported_languages_sorted() {
        let languages = supported_languages();
        assert_eq!(languages.len(), 21);
        assert_eq!(languages[0].name, "Arabic");
        assert_eq!(languages[20].name, "Vietnamese");
        assert!(languages.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn test_names_and_normalization() {
        assert_eq!(language_name("es"), Some("Spanish"));
        assert_eq!(language_name("xx"), None);
        assert_eq!(normalize_language("english"), Some("en"));
        assert_eq!(normalize_language(" JA "), Some("ja"));
        assert_eq!(normalize_language("klingon"), None);
    }

    #[test]
    fn test_split_text_paragraphs() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(30), "b".repeat(30), "c".repeat(30));
        let chunks = split_text(&text, 70);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}\n\n{}", "a".repeat(30), "b".repeat(30)));
        assert_eq!(chunks[1], "c".repeat(30));
    }

    #[test]
    fn test_split_text_long_paragraph_by_sentences() {
        let para = vec!["x".repeat(20); 5].join(". ");
        let chunks = split_text(&para, 50);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 50));
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn test_split_text_empty() {
        assert!(split_text("", 100).is_empty());
        assert!(split_text("\n\n\n\n", 100).is_empty());
    }

    #[tokio::test]
    async fn test_detect_language() {
        let llm = Arc::new(FakeLlm::replying("\"es\""));
        let detected = processor(llm.clone()).detect_language("Hola a todos").await;
        assert_eq!(detected, Language { code: "es", name: "Spanish" });
        assert!(llm.calls()[0].prompt.contains("Hola a todos"));

        let llm = Arc::new(FakeLlm::replying("I cannot tell"));
        assert_eq!(processor(llm).detect_language("???").await, Language::UNKNOWN);

        let llm = Arc::new(FakeLlm::failing());
        assert_eq!(processor(llm).detect_language("text").await, Language::UNKNOWN);
    }

    #[tokio::test]
    async fn test_detect_language_samples_prefix() {
        let llm = Arc::new(FakeLlm::replying("en"));
        let text = format!("{}{}", "a".repeat(1000), "TAIL");
        processor(llm.clone()).detect_language(&text).await;
        assert!(!llm.calls()[0].prompt.contains("TAIL"));
    }

    #[tokio::test]
    async fn test_translate_short_text() {
        let llm = Arc::new(FakeLlm::replying("Bonjour"));
        let translated = processor(llm.clone()).translate_text("Hello", "fr").await;
        assert_eq!(translated, "Bonjour");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("to French"));
        assert_eq!(calls[0].options, CompletionOptions::new(4000, 0.3));
    }

    #[tokio::test]
    async fn test_translate_long_text_in_chunks() {
        let llm = Arc::new(FakeLlm::replying("T"));
        let text = vec!["p".repeat(3000); 3].join("\n\n");
        let translated = processor(llm.clone()).translate_text(&text, "de").await;
        assert_eq!(llm.calls().len(), 3);
        assert_eq!(translated, "T T T");
    }

    #[tokio::test]
    async fn test_failed_chunk_keeps_original() {
        let llm = Arc::new(FakeLlm::new(|_, _| {
            Err(AssistantError::Llm("rate limited".into()))
        }));
        let translated = processor(llm).translate_text("Hello there", "es").await;
        assert_eq!(translated, "Hello there");
    }

    #[tokio::test]
    async fn test_translate_segments_batch() {
        let llm = Arc::new(FakeLlm::new(|_, prompt| {
            let text = prompt.rsplit("\n\n").next().unwrap_or_default();
            Ok(text.to_uppercase())
        }));
        let segments = vec!["one".to_string(), "two".to_string()];
        let translated = processor(llm.clone())
            .translate_segments(&segments, "en")
            .await;
        assert_eq!(translated, vec!["ONE", "TWO"]);
        assert_eq!(llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_translate_segments_fallback() {
        let llm = Arc::new(FakeLlm::replying("merged"));
        let segments = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let translated = processor(llm.clone())
            .translate_segments(&segments, "en")
            .await;
        assert_eq!(translated, vec!["merged"; 3]);
        assert_eq!(llm.calls().len(), 4);
    }
}
