//! Text generation through a language model.

mod openai;

pub use openai::OpenAILanguageModel;

use crate::error::Result;
use async_trait::async_trait;

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// A model that turns a prompt into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` with `model`. An empty response is an error.
    async fn complete(&self, model: &str, prompt: &str, options: CompletionOptions)
        -> Result<String>;
}
