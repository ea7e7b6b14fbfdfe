use crate::error::Result;
use crate::llm::client::ChatModel;
use crate::llm::parser::parse_company_record;
use crate::llm::prompts::{
    analysis_prompt, default_examples, definitions_document, extraction_prompt,
    format_instructions, FewShotExample,
};
use crate::llm::types::*;
use crate::schema::CompanyRecord;
use chrono::Datelike;
use log::debug;
use tokio::sync::mpsc::Sender;

/// Runs the analysis -> extraction prompt chain for one company at a time.
pub struct CompanyEnricher<M> {
    model: M,
    definitions: String,
    format_instructions: String,
    examples: Vec<FewShotExample>,
}

impl<M: ChatModel> CompanyEnricher<M> {
    pub fn new(model: M) -> Result<Self> {
        Ok(Self {
            model,
            definitions: definitions_document(chrono::Utc::now().year())?,
            format_instructions: format_instructions()?,
            examples: Vec::new(),
        })
    }

    /// Prime the extraction prompt with worked examples.
    pub fn with_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.examples = examples;
        self
    }

    pub fn with_default_examples(self) -> Self {
        self.with_examples(default_examples())
    }

    /// Enriches `company`, appending both exchanges to `transcript`.
    ///
    /// The extraction request carries the whole transcript, so it sees the analysis
    /// turn (and any earlier turns the caller chose to keep). A turn is only recorded
    /// once the model has answered it.
    pub async fn enrich(
        &self,
        index: usize,
        company: &str,
        transcript: &mut Vec<ChatMessage>,
        progress: &Option<Sender<EnrichmentEvent>>,
    ) -> Result<CompanyRecord> {
        send_event(
            progress,
            EnrichmentEvent::Analyzing {
                index,
                company: company.to_string(),
            },
        )
        .await;
        let analysis = analysis_prompt(company, &self.definitions);
        self.exchange(transcript, analysis).await?;

        send_event(
            progress,
            EnrichmentEvent::Extracting {
                index,
                company: company.to_string(),
            },
        )
        .await;
        let extraction = extraction_prompt(company, &self.format_instructions, &self.examples);
        let raw = self.exchange(transcript, extraction).await?;

        parse_company_record(&raw, company)
    }

    async fn exchange(&self, transcript: &mut Vec<ChatMessage>, prompt: String) -> Result<String> {
        let mut messages = transcript.clone();
        messages.push(ChatMessage::user(prompt));
        debug!(
            "Sending {} messages ({} chars in prompt)",
            messages.len(),
            messages.last().map(|m| m.content.len()).unwrap_or_default()
        );

        let reply = self.model.complete(&messages).await?;
        debug!("Received {} chars", reply.len());

        messages.push(ChatMessage::assistant(reply.clone()));
        *transcript = messages;
        Ok(reply)
    }
}
