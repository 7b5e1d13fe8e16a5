//! Paisa Statement Extraction Pipeline
//!
//! Turns decoded bank-statement text into persisted transactions via an
//! LLM provider.
//!
//! # Architecture
//!
//! The pipeline runs in fixed stages:
//!
//! 1. `StatementValidator` gates implausible content before any model call
//! 2. `ContentChunker` splits oversized statements on line boundaries
//! 3. `PromptBuilder` renders the extraction prompt per statement or chunk
//! 4. `ProviderGateway` (from `paisa-llm`) runs the call with failover
//! 5. `parse_response` recovers a JSON array from imperfect model output
//! 6. `Materializer` validates candidates and writes them to the store
//!
//! `StatementExtractor` orchestrates the stages, adding per-chunk pacing,
//! a narrow rate-limit retry, and cross-chunk deduplication.
//!
//! # Examples
//!
//! ```
//! use paisa_extractor::{ExtractionRequest, ExtractorConfig, StatementExtractor};
//! use paisa_llm::{MockCompleter, ProviderGateway, ProviderName};
//! use paisa_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let completer = MockCompleter::new(
//!     r#"[{"description":"UPI/SHOP","amount":120.5,"type":"expense"}]"#,
//! );
//! let gateway = ProviderGateway::with_backends(vec![(ProviderName::Groq, completer)]);
//! let store = Arc::new(Mutex::new(SqliteStore::new(":memory:")?));
//!
//! let extractor = StatementExtractor::new(gateway, store, ExtractorConfig::default());
//! let outcome = extractor
//!     .extract(ExtractionRequest::new("kotak bank statement rows", "user-1"))
//!     .await?;
//! assert_eq!(outcome.materialized.inserted(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod extractor;
pub mod materializer;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod tokens;
pub mod types;
pub mod validate;

pub use chunking::{Chunk, ContentChunker};
pub use config::{ExtractorConfig, UploadPolicy};
pub use error::ExtractError;
pub use extractor::{ExtractionOutcome, StatementExtractor};
pub use materializer::{MaterializeOutcome, Materializer};
pub use parser::parse_response;
pub use prompt::PromptBuilder;
pub use retry::RetryPolicy;
pub use tokens::estimate_tokens;
pub use types::{ExtractionRequest, RawTransaction};
pub use validate::StatementValidator;
