use crate::error::Result;
use crate::llm::types::{send_event, EnrichmentEvent};
use crate::llm::{ChatModel, CompanyEnricher, SessionHistory};
use crate::schema::CompanyRecord;
use crate::store::ResultStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc::Sender;

/// Session id used when every company shares one transcript.
pub const SHARED_SESSION_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// Each company gets a fresh transcript that is dropped once it has been processed.
    #[default]
    PerCompany,
    /// All companies append to one transcript for the lifetime of the run.
    Shared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCompany {
    pub index: usize,
    pub company: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentReport {
    pub records: BTreeMap<String, CompanyRecord>,
    pub failures: Vec<FailedCompany>,
}

/// Feeds companies through the enricher one at a time, snapshotting after each success.
pub struct EnrichmentDriver<M> {
    enricher: CompanyEnricher<M>,
    store: ResultStore,
    sessions: SessionHistory,
    policy: SessionPolicy,
    progress: Option<Sender<EnrichmentEvent>>,
}

impl<M: ChatModel> EnrichmentDriver<M> {
    pub fn new(enricher: CompanyEnricher<M>, store: ResultStore) -> Self {
        Self {
            enricher,
            store,
            sessions: SessionHistory::new(),
            policy: SessionPolicy::default(),
            progress: None,
        }
    }

    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: Sender<EnrichmentEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Processes `companies` in order.
    ///
    /// A company that fails analysis, extraction, parsing or the snapshot write is
    /// reported and skipped; the run always reaches the last company.
    pub async fn run(mut self, companies: &[String]) -> Result<EnrichmentReport> {
        info!(
            "Enriching {} companies into {}",
            companies.len(),
            self.store.path().display()
        );
        send_event(
            &self.progress,
            EnrichmentEvent::Starting {
                total: companies.len(),
            },
        )
        .await;

        let mut failures = Vec::new();

        for (index, company) in companies.iter().enumerate() {
            let session_id = self.session_id(index, company);
            let outcome = self
                .enricher
                .enrich(
                    index,
                    company,
                    self.sessions.transcript(&session_id),
                    &self.progress,
                )
                .await;
            if self.policy == SessionPolicy::PerCompany {
                self.sessions.discard(&session_id);
            }

            let outcome = match outcome {
                Ok(record) => {
                    self.store.insert(company.clone(), record.clone());
                    self.store.persist().await.map(|()| record)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(record) => {
                    info!("[{}] Enriched '{}'", index, company);
                    send_event(
                        &self.progress,
                        EnrichmentEvent::Enriched {
                            index,
                            company: company.clone(),
                            record: Box::new(record),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    // a record whose snapshot failed stays in the store for the next write
                    warn!("[{}] Skipping '{}': {}", index, company, e);
                    let reason = e.to_string();
                    send_event(
                        &self.progress,
                        EnrichmentEvent::Skipped {
                            index,
                            company: company.clone(),
                            reason: reason.clone(),
                        },
                    )
                    .await;
                    failures.push(FailedCompany {
                        index,
                        company: company.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Finished: {} enriched, {} skipped",
            companies.len() - failures.len(),
            failures.len()
        );
        send_event(
            &self.progress,
            EnrichmentEvent::Finished {
                succeeded: companies.len() - failures.len(),
                failed: failures.len(),
            },
        )
        .await;

        Ok(EnrichmentReport {
            records: self.store.into_records(),
            failures,
        })
    }

    fn session_id(&self, index: usize, company: &str) -> String {
        match self.policy {
            SessionPolicy::PerCompany => format!("{}:{}", index, company),
            SessionPolicy::Shared => SHARED_SESSION_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_follow_policy() {
        struct Unused;

        #[async_trait::async_trait]
        impl ChatModel for Unused {
            async fn complete(&self, _: &[crate::llm::ChatMessage]) -> Result<String> {
                unreachable!()
            }
        }

        let driver = EnrichmentDriver::new(
            CompanyEnricher::new(Unused).unwrap(),
            ResultStore::new("/unused"),
        );
        assert_eq!(driver.session_id(2, "Acme"), "2:Acme");

        let driver = driver.with_session_policy(SessionPolicy::Shared);
        assert_eq!(driver.session_id(2, "Acme"), SHARED_SESSION_ID);
        assert_eq!(driver.session_id(5, "Globex"), SHARED_SESSION_ID);
    }
}
