//! Paisa LLM Provider Layer
//!
//! Pluggable LLM backends for statement extraction.
//!
//! # Architecture
//!
//! This crate defines the `ChatCompleter` trait plus concrete clients for
//! the supported hosted providers (Groq, Gemini, OpenAI), and the
//! `ProviderGateway` which owns provider selection and ordered failover.
//! Clients are constructed once at process start from bound credentials and
//! passed by reference; there is no lazy global client state.
//!
//! # Providers
//!
//! - `MockCompleter`: deterministic mock for testing
//! - `ChatCompletionsClient`: OpenAI-compatible chat API (Groq, OpenAI)
//! - `GeminiClient`: Google Gemini `generateContent` API
//!
//! # Examples
//!
//! ```
//! use paisa_llm::{ChatCompleter, ChatRequest, MockCompleter};
//!
//! # async fn example() {
//! let provider = MockCompleter::new("Hello from LLM!");
//! let request = ChatRequest::extraction("system", "test prompt");
//! let result = provider.complete(&request).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod clients;
pub mod gateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use clients::{ChatCompletionsClient, GeminiClient, ProviderClient};
pub use gateway::{ModelOutput, ProviderCredentials, ProviderGateway, ProviderInfo};

/// Sampling temperature for extraction calls; near zero to minimize variance
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Completion token ceiling for extraction calls
pub const EXTRACTION_MAX_TOKENS: u32 = 8000;

/// Known rate-limit signatures in provider error bodies
const RATE_LIMIT_SIGNATURES: &[&str] = &["rate_limit_exceeded", "429", "Rate limit"];

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// No provider credential is configured
    #[error("No AI provider configured. Set GROQ_API_KEY, GEMINI_API_KEY, or OPENAI_API_KEY")]
    NoProviderConfigured,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether this error is a provider-side throttle
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }

    /// Classify a provider error body: throttles become `RateLimited`
    pub fn from_provider_body(status: u16, body: String) -> Self {
        if status == 429 || RATE_LIMIT_SIGNATURES.iter().any(|sig| body.contains(sig)) {
            LlmError::RateLimited(body)
        } else {
            LlmError::Communication(format!("HTTP {}: {}", status, body))
        }
    }
}

/// The supported LLM backends, in fixed preference order
///
/// Auto-selection tries Groq first (fastest, most generous free tier), then
/// Gemini, then OpenAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// Groq hosted inference (OpenAI-compatible API)
    Groq,
    /// Google Gemini
    Gemini,
    /// OpenAI
    OpenAi,
}

impl ProviderName {
    /// Fixed priority order for auto-selection and failover
    pub const PRIORITY: [ProviderName; 3] =
        [ProviderName::Groq, ProviderName::Gemini, ProviderName::OpenAi];

    /// Parse a provider name as it appears in `AI_PROVIDER`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Some(ProviderName::Groq),
            "gemini" => Some(ProviderName::Gemini),
            "openai" => Some(ProviderName::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Groq => write!(f, "groq"),
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::OpenAi => write!(f, "openai"),
        }
    }
}

/// Caller preference for provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderChoice {
    /// Try providers in fixed priority order, first configured wins
    #[default]
    Auto,
    /// Use the named provider if its credential is configured
    Explicit(ProviderName),
}

impl ProviderChoice {
    /// Parse the `AI_PROVIDER` environment value; unknown names mean auto
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) => ProviderName::parse(v)
                .map(ProviderChoice::Explicit)
                .unwrap_or(ProviderChoice::Auto),
            None => ProviderChoice::Auto,
        }
    }
}

/// A single chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// System message framing the task
    pub system: String,
    /// User message carrying the statement text and rules
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token ceiling
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Build a request with the extraction calling convention
    /// (near-zero temperature, fixed completion budget)
    pub fn extraction(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: EXTRACTION_TEMPERATURE,
            max_tokens: EXTRACTION_MAX_TOKENS,
        }
    }
}

/// Trait for chat-completion backends
///
/// Implemented by the concrete provider clients and by `MockCompleter`.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Run one completion, returning the raw model output text
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Mock completer for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use paisa_llm::{ChatCompleter, ChatRequest, MockCompleter};
///
/// # async fn example() {
/// // Simple fixed response
/// let provider = MockCompleter::new("Fixed response");
/// let request = ChatRequest::extraction("sys", "any prompt");
/// assert_eq!(provider.complete(&request).await.unwrap(), "Fixed response");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockCompleter {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    rate_limited: Arc<Mutex<bool>>,
    fail_all: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockCompleter {
    /// Create a new MockCompleter with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            rate_limited: Arc::new(Mutex::new(false)),
            fail_all: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given user prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), Ok(response.into()));
    }

    /// Configure an error for a specific user prompt
    pub fn add_error(&mut self, prompt: impl Into<String>, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), Err(message.into()));
    }

    /// Make every call fail with a communication error
    pub fn fail_all(&mut self, message: impl Into<String>) {
        *self.fail_all.lock().unwrap() = Some(message.into());
    }

    /// Make every call fail with a rate-limit error until cleared
    pub fn set_rate_limited(&self, limited: bool) {
        *self.rate_limited.lock().unwrap() = limited;
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockCompleter {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl ChatCompleter for MockCompleter {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap() += 1;

        if *self.rate_limited.lock().unwrap() {
            return Err(LlmError::RateLimited("rate_limit_exceeded".to_string()));
        }

        if let Some(message) = self.fail_all.lock().unwrap().clone() {
            return Err(LlmError::Communication(message));
        }

        let responses = self.responses.lock().unwrap();
        if let Some(result) = responses.get(&request.user) {
            return match result {
                Ok(response) => Ok(response.clone()),
                Err(message) => Err(LlmError::Other(message.clone())),
            };
        }

        Ok(self.default_response.clone())
    }
}
