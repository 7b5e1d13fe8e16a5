//! Error types for the extraction pipeline

use paisa_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during statement extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Content is empty or shorter than the minimum plausible statement
    #[error("Invalid or empty file content")]
    EmptyContent,

    /// Content exceeds the caller-facing size ceiling
    #[error("Content too large: {0} chars (max: {1})")]
    TooLarge(usize, usize),

    /// Content does not look like a bank statement
    #[error(
        "This does not appear to be a bank statement. Please upload a valid \
         bank statement (PDF, CSV, or TXT) containing transaction details"
    )]
    NotAStatement,

    /// No provider credential is configured (operator misconfiguration)
    #[error("No AI provider configured")]
    NoProviderConfigured,

    /// No recovery strategy could extract a JSON array from the model output
    #[error("Failed to parse AI response as JSON: {0}")]
    UnparseableResponse(String),

    /// The model output parsed, but its top level is not an array
    #[error("AI response is not in expected array format (got {0})")]
    NotAnArray(String),

    /// The model returned an empty array
    #[error("No transactions found in AI response")]
    EmptyResult,

    /// Provider-side throttle after all recovery attempts
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Every chunk failed or produced nothing
    #[error("No transactions found in any chunk")]
    NoTransactionsExtracted,

    /// Every extracted record failed required-field validation
    #[error("No valid transactions found in the statement")]
    NoValidTransactions,

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),

    /// Provider call exceeded the extraction timeout
    #[error("Extraction timeout")]
    Timeout,
}

impl ExtractError {
    /// Whether this error is a provider-side throttle (retryable per chunk)
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ExtractError::RateLimited(_))
    }
}

impl From<LlmError> for ExtractError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::NoProviderConfigured => ExtractError::NoProviderConfigured,
            LlmError::RateLimited(msg) => ExtractError::RateLimited(msg),
            other => ExtractError::Llm(other.to_string()),
        }
    }
}
