pub mod client;
pub mod enricher;
pub mod gemini;
pub mod openai;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod types;

pub use client::*;
pub use enricher::*;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use parser::parse_company_record;
pub use session::SessionHistory;
pub use types::{ChatMessage, EnrichmentEvent, Role};
