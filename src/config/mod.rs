//! Configuration module for yt-assistant.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{EvaluationPrompts, Prompts, QaPrompts, SummaryPrompts, TranslationPrompts};
pub use settings::{
    AudioSettings, ChunkingSettings, GeneralSettings, ModelSettings, PromptSettings, Settings,
    StorageSettings, TranscriptionSettings,
};
