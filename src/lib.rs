//! # Company Enricher
//!
//! Enriches a list of company names with structured firmographic data by asking a
//! hosted language model two chained questions per company and validating the answer
//! against a fixed schema.
//!
//! ## Pipeline
//!
//! - **Source**: a newline-delimited list of names fetched from object storage
//!   ([`storage`]).
//! - **Analysis**: a free-form prompt embedding the field definitions; the reply
//!   stays in the company's conversation transcript.
//! - **Extraction**: a JSON-constrained prompt over the same transcript, parsed into a
//!   [`CompanyRecord`] ([`llm::parse_company_record`]).
//! - **Snapshot**: every success rewrites the whole result mapping to disk
//!   ([`ResultStore`]).
//!
//! A company whose model call, parse or validation fails is skipped; it never
//! appears in the output with a partial record.
//!
//! ## Example
//!
//! ```rust,ignore
//! use company_enricher::*;
//!
//! let config = Config::from_env()?;
//! let store = storage::store_from_config(&config.source);
//! let companies = storage::load_company_names(store.as_ref(), &config.companies_key).await?;
//!
//! let enricher = CompanyEnricher::new(llm::model_from_config(&config.model))?;
//! let report = EnrichmentDriver::new(enricher, ResultStore::new(&config.output_path))
//!     .run(&companies)
//!     .await?;
//! println!("{} enriched, {} skipped", report.records.len(), report.failures.len());
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod llm;
pub mod schema;
pub mod storage;
pub mod store;

pub use config::{Config, ModelConfig, Provider, S3Config, SourceConfig};
pub use driver::{EnrichmentDriver, EnrichmentReport, FailedCompany, SessionPolicy};
pub use error::{EnrichError, Result};
pub use llm::{ChatMessage, ChatModel, CompanyEnricher, EnrichmentEvent};
pub use schema::*;
pub use storage::{load_company_names, ObjectStore};
pub use store::ResultStore;
