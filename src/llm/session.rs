use crate::llm::types::ChatMessage;
use std::collections::HashMap;

/// Conversation transcripts keyed by session id, created on first use.
#[derive(Debug, Default)]
pub struct SessionHistory {
    sessions: HashMap<String, Vec<ChatMessage>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&mut self, session_id: &str) -> &mut Vec<ChatMessage> {
        self.sessions.entry(session_id.to_string()).or_default()
    }

    pub fn get(&self, session_id: &str) -> Option<&[ChatMessage]> {
        self.sessions.get(session_id).map(Vec::as_slice)
    }

    pub fn discard(&mut self, session_id: &str) -> Option<Vec<ChatMessage>> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
