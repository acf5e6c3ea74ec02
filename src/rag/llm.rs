//! Completion model binding.

use crate::config::LlmSettings;
use crate::error::{Result, VidchatError};
use crate::openai::OpenAIClient;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A remote text completion model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete `prompt` under the `system` instruction.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// OpenAI chat completion model with a fixed model name and temperature.
pub struct OpenAIChatModel {
    client: OpenAIClient,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(client: OpenAIClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(client: OpenAIClient, settings: &LlmSettings) -> Self {
        Self::new(client, &settings.model, settings.temperature)
    }
}

#[async_trait]
impl CompletionModel for OpenAIChatModel {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| VidchatError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidchatError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidchatError::Rag(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VidchatError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| VidchatError::Rag("Empty response from LLM".to_string()))?
            .clone();

        debug!("Completion returned {} characters", answer.len());
        Ok(answer)
    }
}
