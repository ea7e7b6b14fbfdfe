use crate::error::{EnrichError, Result};
use crate::llm::client::ChatModel;
use crate::llm::types::*;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible `/chat/completions` endpoint (OpenAI, Groq).
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        debug!("POST {} ({} messages)", url, messages.len());

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(EnrichError::Transport(format!(
                "Chat completion error (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;
        first_choice_text(body)
    }
}

fn first_choice_text(body: ChatCompletionResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .ok_or_else(|| EnrichError::Format("No choices returned".to_string()))?
        .message
        .content
        .ok_or_else(|| EnrichError::Format("Model returned an empty message".to_string()))
}
