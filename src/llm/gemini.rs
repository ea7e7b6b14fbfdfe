use crate::error::{EnrichError, Result};
use crate::llm::client::ChatModel;
use crate::llm::types::*;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
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

    fn build_request(&self, messages: &[ChatMessage]) -> GenerateContentRequest {
        let mut system_text = Vec::new();
        let mut contents = Vec::new();
        for message in messages {
            match message.role {
                Role::System => system_text.push(message.content.as_str()),
                Role::User => contents.push(Content::text("user", &message.content)),
                Role::Assistant => contents.push(Content::text("model", &message.content)),
            }
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_text.is_empty())
                .then(|| Content::text("user", &system_text.join("\n\n"))),
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let payload = self.build_request(messages);
        debug!(
            "Gemini generateContent on {} ({} turns)",
            self.model,
            payload.contents.len()
        );

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(EnrichError::Transport(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        candidate_text(body)
    }
}

fn candidate_text(body: GenerateContentResponse) -> Result<String> {
    let candidate = body
        .candidates
        .ok_or_else(|| EnrichError::Format("No candidates returned".to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| EnrichError::Format("Empty candidates list".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text),
            Part::Other(_) => None,
        })
        .collect();

    if text.is_empty() {
        return Err(EnrichError::Format(
            "Model returned non-text content".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transcript_maps_to_gemini_roles() {
        let client = GeminiClient::new("key".to_string(), "gemini-1.5-flash");
        let request = client.build_request(&[
            ChatMessage::system("Be terse."),
            ChatMessage::user("Analyse Acme Corp"),
            ChatMessage::assistant("Anvils."),
            ChatMessage::user("Extract details"),
        ]);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"].as_array().unwrap().len(), 3);
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][1]["parts"][0]["text"], "Anvils.");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be terse.");
        assert_eq!(value["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_no_system_instruction_when_absent() {
        let client = GeminiClient::new("key".to_string(), "gemini-1.5-flash");
        let value = serde_json::to_value(client.build_request(&[ChatMessage::user("hi")])).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_candidate_text_joins_text_parts() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"a\":"}, {"inlineData": {"mimeType": "x"}}, {"text": "1}"}]
                }
            }]
        }))
        .unwrap();
        assert_eq!(candidate_text(body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_candidate_text_errors() {
        let body: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(candidate_text(body), Err(EnrichError::Format(_))));

        let body: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"content": {"parts": []}}]})).unwrap();
        assert!(matches!(candidate_text(body), Err(EnrichError::Format(_))));
    }
}
