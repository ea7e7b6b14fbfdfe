use crate::schema::CompanyRecord;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnrichmentEvent {
    Starting { total: usize },
    Analyzing { index: usize, company: String },
    Extracting { index: usize, company: String },
    Enriched { index: usize, company: String, record: Box<CompanyRecord> },
    Skipped { index: usize, company: String, reason: String },
    Finished { succeeded: usize, failed: usize },
}

impl EnrichmentEvent {
    /// Position of the company in the input list, for per-company events.
    pub fn index(&self) -> Option<usize> {
        match self {
            EnrichmentEvent::Analyzing { index, .. }
            | EnrichmentEvent::Extracting { index, .. }
            | EnrichmentEvent::Enriched { index, .. }
            | EnrichmentEvent::Skipped { index, .. } => Some(*index),
            EnrichmentEvent::Starting { .. } | EnrichmentEvent::Finished { .. } => None,
        }
    }
}

pub(crate) async fn send_event(sender: &Option<Sender<EnrichmentEvent>>, event: EnrichmentEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}

// --- OpenAI-compatible chat completions wire format ---

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

// --- Gemini generateContent wire format ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Content,
}
