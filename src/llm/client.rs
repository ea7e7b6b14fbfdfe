use crate::config::{ModelConfig, Provider};
use crate::error::Result;
use crate::llm::gemini::GeminiClient;
use crate::llm::openai::OpenAiClient;
use crate::llm::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// A hosted model that completes an ordered chat transcript.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for &T {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages).await
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Box<T> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages).await
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages).await
    }
}

pub fn model_from_config(config: &ModelConfig) -> Box<dyn ChatModel> {
    match config.provider {
        Provider::OpenAi | Provider::Groq => Box::new(
            OpenAiClient::new(config.api_key.clone(), config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_temperature(config.temperature),
        ),
        Provider::Gemini => Box::new(
            GeminiClient::new(config.api_key.clone(), config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_temperature(config.temperature),
        ),
    }
}
