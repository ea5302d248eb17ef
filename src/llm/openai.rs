//! OpenAI completions and chat completions.

use super::{CompletionOptions, LanguageModel};
use crate::error::{AssistantError, Result};
use crate::openai::{create_client, OpenAIClient};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, CreateCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Language model backed by the OpenAI API.
///
/// Models named `*-instruct` only exist on the legacy completions endpoint;
/// everything else goes through chat completions.
pub struct OpenAILanguageModel {
    client: OpenAIClient,
}

impl OpenAILanguageModel {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(create_client()?))
    }

    pub fn with_client(client: OpenAIClient) -> Self {
        Self { client }
    }

    async fn legacy_completion(
        &self,
        model: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        let request = CreateCompletionRequestArgs::default()
            .model(model)
            .prompt(prompt.to_string())
            .max_tokens(options.max_tokens)
            .temperature(options.temperature)
            .build()
            .map_err(|e| AssistantError::Llm(e.to_string()))?;

        let response = self
            .client
            .completions()
            .create(request)
            .await
            .map_err(|e| AssistantError::OpenAI(format!("Completion request failed: {}", e)))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default())
    }

    async fn chat_completion(
        &self,
        model: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| AssistantError::Llm(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_completion_tokens(options.max_tokens)
            .temperature(options.temperature)
            .build()
            .map_err(|e| AssistantError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AssistantError::OpenAI(format!("Chat request failed: {}", e)))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Whether a model is served by the legacy completions endpoint.
pub(crate) fn is_instruct_model(model: &str) -> bool {
    model.ends_with("-instruct") || model.contains("-instruct-")
}

#[async_trait]
impl LanguageModel for OpenAILanguageModel {
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        let text = if is_instruct_model(model) {
            self.legacy_completion(model, prompt, options).await?
        } else {
            self.chat_completion(model, prompt, options).await?
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AssistantError::Llm(format!(
                "Empty response from {}",
                model
            )));
        }

        debug!("Received {} characters from {}", text.len(), model);
        Ok(text.to_string())
    }
}
