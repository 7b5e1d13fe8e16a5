//! Provider selection and ordered failover
//!
//! The gateway owns the set of configured backends and the policy for
//! choosing among them. It performs no storage access and has no side
//! effects beyond the network call itself.

use crate::clients::{ChatCompletionsClient, GeminiClient, ProviderClient};
use crate::{ChatCompleter, ChatRequest, LlmError, ProviderChoice, ProviderName};
use serde::Serialize;
use tracing::{info, warn};

/// Provider API keys bound at process start
///
/// Presence of a key determines provider availability; absence of all three
/// means extraction cannot run.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    /// Groq API key (`GROQ_API_KEY`)
    pub groq_api_key: Option<String>,
    /// Gemini API key (`GEMINI_API_KEY`)
    pub gemini_api_key: Option<String>,
    /// OpenAI API key (`OPENAI_API_KEY`)
    pub openai_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Read credentials from the environment
    pub fn from_env() -> Self {
        Self {
            groq_api_key: std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }

    /// Whether any provider credential is present
    pub fn any_configured(&self) -> bool {
        self.groq_api_key.is_some()
            || self.gemini_api_key.is_some()
            || self.openai_api_key.is_some()
    }
}

/// Informational description of a configured provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Provider name
    pub name: ProviderName,
    /// Model the backend is bound to
    pub model: String,
    /// Availability status
    pub status: &'static str,
}

/// Raw output of whichever backend served a request
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// The provider that produced the text
    pub provider: ProviderName,
    /// Unparsed model output
    pub text: String,
}

/// Abstracts over the configured LLM backends with ordered failover
///
/// Generic over the completer so tests can substitute `MockCompleter`
/// backends for the real HTTP clients.
pub struct ProviderGateway<C> {
    backends: Vec<(ProviderName, C)>,
}

impl ProviderGateway<ProviderClient> {
    /// Build the production gateway from bound credentials
    ///
    /// Backends are constructed once here and reused across calls; a
    /// missing credential simply leaves that provider out of the set.
    pub fn from_credentials(credentials: &ProviderCredentials) -> Self {
        let mut backends = Vec::new();

        if let Some(key) = &credentials.groq_api_key {
            backends.push((
                ProviderName::Groq,
                ProviderClient::Groq(ChatCompletionsClient::groq(key.clone())),
            ));
        }
        if let Some(key) = &credentials.gemini_api_key {
            backends.push((
                ProviderName::Gemini,
                ProviderClient::Gemini(GeminiClient::new(key.clone())),
            ));
        }
        if let Some(key) = &credentials.openai_api_key {
            backends.push((
                ProviderName::OpenAi,
                ProviderClient::OpenAi(ChatCompletionsClient::openai(key.clone())),
            ));
        }

        Self { backends }
    }

    /// Describe the configured providers (for the informational endpoint)
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.backends
            .iter()
            .map(|(name, client)| ProviderInfo {
                name: *name,
                model: client.model().to_string(),
                status: "available",
            })
            .collect()
    }
}

impl<C: ChatCompleter> ProviderGateway<C> {
    /// Build a gateway from explicit backends (used by tests)
    pub fn with_backends(backends: Vec<(ProviderName, C)>) -> Self {
        Self { backends }
    }

    /// Whether the named provider has a configured backend
    pub fn is_configured(&self, name: ProviderName) -> bool {
        self.backends.iter().any(|(n, _)| *n == name)
    }

    /// Names of configured providers in priority order
    pub fn configured(&self) -> Vec<ProviderName> {
        ProviderName::PRIORITY
            .iter()
            .copied()
            .filter(|n| self.is_configured(*n))
            .collect()
    }

    fn backend(&self, name: ProviderName) -> Option<&C> {
        self.backends
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    /// The attempt order for a call: explicit choice first (when its
    /// credential is configured), then the remaining configured providers
    /// in fixed priority order. Each provider appears at most once, so a
    /// provider that failed rate-limited is never immediately re-tried.
    fn attempt_order(&self, choice: ProviderChoice) -> Vec<ProviderName> {
        let mut order = Vec::new();

        if let ProviderChoice::Explicit(name) = choice {
            if self.is_configured(name) {
                order.push(name);
            }
        }

        for name in self.configured() {
            if !order.contains(&name) {
                order.push(name);
            }
        }

        order
    }

    /// Run a completion with selection policy and ordered failover
    ///
    /// The first provider's error is what surfaces if every attempt fails;
    /// fallback errors are logged but not returned.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        choice: ProviderChoice,
    ) -> Result<ModelOutput, LlmError> {
        let order = self.attempt_order(choice);
        if order.is_empty() {
            return Err(LlmError::NoProviderConfigured);
        }

        let mut first_error: Option<LlmError> = None;

        for name in order {
            let backend = match self.backend(name) {
                Some(backend) => backend,
                None => continue,
            };

            info!(provider = %name, "Calling LLM provider");
            match backend.complete(request).await {
                Ok(text) => {
                    return Ok(ModelOutput {
                        provider: name,
                        text,
                    });
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "Provider call failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        Err(first_error.unwrap_or(LlmError::NoProviderConfigured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockCompleter;

    fn request() -> ChatRequest {
        ChatRequest::extraction("sys", "prompt")
    }

    #[tokio::test]
    async fn test_no_provider_configured() {
        let gateway: ProviderGateway<MockCompleter> = ProviderGateway::with_backends(vec![]);
        let result = gateway.complete(&request(), ProviderChoice::Auto).await;
        assert!(matches!(result, Err(LlmError::NoProviderConfigured)));
    }

    #[tokio::test]
    async fn test_auto_prefers_groq() {
        let gateway = ProviderGateway::with_backends(vec![
            (ProviderName::Gemini, MockCompleter::new("from gemini")),
            (ProviderName::Groq, MockCompleter::new("from groq")),
        ]);

        let output = gateway
            .complete(&request(), ProviderChoice::Auto)
            .await
            .unwrap();
        assert_eq!(output.provider, ProviderName::Groq);
        assert_eq!(output.text, "from groq");
    }

    #[tokio::test]
    async fn test_explicit_choice_wins() {
        let gateway = ProviderGateway::with_backends(vec![
            (ProviderName::Groq, MockCompleter::new("from groq")),
            (ProviderName::OpenAi, MockCompleter::new("from openai")),
        ]);

        let output = gateway
            .complete(&request(), ProviderChoice::Explicit(ProviderName::OpenAi))
            .await
            .unwrap();
        assert_eq!(output.provider, ProviderName::OpenAi);
    }

    #[tokio::test]
    async fn test_unconfigured_explicit_falls_back_to_auto() {
        let gateway = ProviderGateway::with_backends(vec![(
            ProviderName::Gemini,
            MockCompleter::new("from gemini"),
        )]);

        let output = gateway
            .complete(&request(), ProviderChoice::Explicit(ProviderName::Groq))
            .await
            .unwrap();
        assert_eq!(output.provider, ProviderName::Gemini);
    }

    #[tokio::test]
    async fn test_failover_to_next_configured() {
        let mut groq = MockCompleter::new("unused");
        groq.fail_all("connection refused");

        let gateway = ProviderGateway::with_backends(vec![
            (ProviderName::Groq, groq),
            (ProviderName::Gemini, MockCompleter::new("from gemini")),
        ]);

        let output = gateway
            .complete(&request(), ProviderChoice::Auto)
            .await
            .unwrap();
        assert_eq!(output.provider, ProviderName::Gemini);
        assert_eq!(output.text, "from gemini");
    }

    #[tokio::test]
    async fn test_all_fail_surfaces_first_error() {
        let groq = MockCompleter::new("unused");
        groq.set_rate_limited(true);
        let mut gemini = MockCompleter::new("unused");
        gemini.fail_all("gemini down");

        let gateway = ProviderGateway::with_backends(vec![
            (ProviderName::Groq, groq.clone()),
            (ProviderName::Gemini, gemini.clone()),
        ]);

        let result = gateway.complete(&request(), ProviderChoice::Auto).await;
        // Original error (Groq's rate limit) surfaces, not Gemini's
        assert!(matches!(result, Err(LlmError::RateLimited(_))));
        // Each provider was tried exactly once
        assert_eq!(groq.call_count(), 1);
        assert_eq!(gemini.call_count(), 1);
    }
}
