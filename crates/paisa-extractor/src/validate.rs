//! Cheap statement plausibility gate
//!
//! Rejects input before any LLM call is attempted: empty or trivially short
//! content, content over the caller-facing size ceiling, and content with no
//! bank-statement keyword. The keyword check is a deliberately permissive
//! substring heuristic; any single match passes.

use crate::config::ExtractorConfig;
use crate::error::ExtractError;

/// Validates that content plausibly looks like a bank statement
#[derive(Debug, Clone)]
pub struct StatementValidator {
    keywords: Vec<String>,
    min_length: usize,
    max_length: usize,
}

impl StatementValidator {
    /// Create a validator with an explicit keyword list and bounds
    pub fn new(keywords: Vec<String>, min_length: usize, max_length: usize) -> Self {
        let keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        Self {
            keywords,
            min_length,
            max_length,
        }
    }

    /// Build a validator from pipeline configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(
            config.statement_keywords.clone(),
            config.min_content_length,
            config.max_content_length,
        )
    }

    /// Check content; `Ok(())` means it is worth an LLM call
    pub fn validate(&self, content: &str) -> Result<(), ExtractError> {
        if content.trim().len() < self.min_length {
            return Err(ExtractError::EmptyContent);
        }

        if content.len() > self.max_length {
            return Err(ExtractError::TooLarge(content.len(), self.max_length));
        }

        let lower = content.to_lowercase();
        if !self.keywords.iter().any(|k| lower.contains(k)) {
            return Err(ExtractError::NotAStatement);
        }

        Ok(())
    }
}
