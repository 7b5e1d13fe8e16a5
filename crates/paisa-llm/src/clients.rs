//! Hosted provider client implementations
//!
//! Groq and OpenAI speak the same OpenAI-compatible chat-completions wire
//! format, so both are served by `ChatCompletionsClient`. Gemini has its own
//! `generateContent` shape. All clients are plain structs constructed once
//! from a bound API key; the reqwest client is built at construction time
//! with a request timeout.

use crate::{ChatCompleter, ChatRequest, LlmError, ProviderName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Groq chat-completions endpoint (OpenAI-compatible)
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default Groq model
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// OpenAI chat-completions endpoint
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default OpenAI model
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Gemini API base
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default Gemini model
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default timeout for provider requests (120 seconds; large statements
/// produce slow completions)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

/// Client for OpenAI-compatible chat-completions APIs (Groq, OpenAI)
pub struct ChatCompletionsClient {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl ChatCompletionsClient {
    /// Create a client against an arbitrary OpenAI-compatible endpoint
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client: build_http_client(),
        }
    }

    /// Create a Groq client with the default model
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(GROQ_ENDPOINT, GROQ_MODEL, api_key)
    }

    /// Create an OpenAI client with the default model
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(OPENAI_ENDPOINT, OPENAI_MODEL, api_key)
    }

    /// The model this client is bound to
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompleter for ChatCompletionsClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_provider_body(status.as_u16(), body));
        }

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))
    }
}

/// Client for the Gemini `generateContent` API
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiClient {
    /// Create a Gemini client with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, GEMINI_MODEL)
    }

    /// Create a Gemini client for a specific model
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: build_http_client(),
        }
    }

    /// The model this client is bound to
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompleter for GeminiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let body = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: request.system.clone(),
                }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.user.clone(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_provider_body(status.as_u16(), body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                LlmError::InvalidResponse("Response contained no candidates".to_string())
            })
    }
}

/// A configured backend for one provider
///
/// The gateway holds one of these per configured credential so the three
/// wire formats share a single completer type.
pub enum ProviderClient {
    /// Groq via the OpenAI-compatible API
    Groq(ChatCompletionsClient),
    /// Google Gemini
    Gemini(GeminiClient),
    /// OpenAI
    OpenAi(ChatCompletionsClient),
}

impl ProviderClient {
    /// Which provider this client serves
    pub fn provider(&self) -> ProviderName {
        match self {
            ProviderClient::Groq(_) => ProviderName::Groq,
            ProviderClient::Gemini(_) => ProviderName::Gemini,
            ProviderClient::OpenAi(_) => ProviderName::OpenAi,
        }
    }

    /// The model this backend is bound to
    pub fn model(&self) -> &str {
        match self {
            ProviderClient::Groq(c) | ProviderClient::OpenAi(c) => c.model(),
            ProviderClient::Gemini(c) => c.model(),
        }
    }
}

#[async_trait]
impl ChatCompleter for ProviderClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        match self {
            ProviderClient::Groq(c) | ProviderClient::OpenAi(c) => c.complete(request).await,
            ProviderClient::Gemini(c) => c.complete(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_client_defaults() {
        let client = ChatCompletionsClient::groq("key");
        assert_eq!(client.endpoint, GROQ_ENDPOINT);
        assert_eq!(client.model(), GROQ_MODEL);
    }

    #[test]
    fn test_openai_client_defaults() {
        let client = ChatCompletionsClient::openai("key");
        assert_eq!(client.endpoint, OPENAI_ENDPOINT);
        assert_eq!(client.model(), OPENAI_MODEL);
    }

    #[test]
    fn test_provider_client_names() {
        let groq = ProviderClient::Groq(ChatCompletionsClient::groq("key"));
        let gemini = ProviderClient::Gemini(GeminiClient::new("key"));
        let openai = ProviderClient::OpenAi(ChatCompletionsClient::openai("key"));

        assert_eq!(groq.provider(), ProviderName::Groq);
        assert_eq!(gemini.provider(), ProviderName::Gemini);
        assert_eq!(openai.provider(), ProviderName::OpenAi);
        assert_eq!(gemini.model(), GEMINI_MODEL);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let client =
            ChatCompletionsClient::new("http://127.0.0.1:9/never", "test-model", "key");
        let request = ChatRequest::extraction("sys", "user");
        let result = client.complete(&request).await;

        match result {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other.map(|_| ())),
        }
    }
}
