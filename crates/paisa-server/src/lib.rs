//! Paisa Upload Server
//!
//! Thin HTTP surface over the extraction pipeline: statement upload,
//! provider info, and health check. Provider credentials come from the
//! environment (`GROQ_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY`, and
//! optionally `AI_PROVIDER` to pin a provider); everything else comes from
//! the TOML config file.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use paisa_extractor::StatementExtractor;
use paisa_llm::{ProviderChoice, ProviderCredentials, ProviderGateway};
use paisa_store::SqliteStore;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Failed to open the transaction store
    #[error("Store error: {0}")]
    Store(String),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the upload HTTP server
///
/// Binds provider credentials from the environment, opens the store, and
/// serves until the process is stopped. Starting with no credentials is
/// allowed; uploads then fail with a configuration error while health and
/// provider info keep answering.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Paisa upload server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database path: {}", config.database_path);

    let credentials = ProviderCredentials::from_env();
    if !credentials.any_configured() {
        warn!("No provider credentials configured; uploads will be rejected");
    }

    let gateway = ProviderGateway::from_credentials(&credentials);
    let providers = gateway.available_providers();
    info!("Configured providers: {}", providers.len());

    let provider_choice =
        ProviderChoice::from_env_value(std::env::var("AI_PROVIDER").ok().as_deref());

    let store = SqliteStore::new(&config.database_path)
        .map_err(|e| ServerError::Store(e.to_string()))?;
    let extractor = Arc::new(StatementExtractor::new(
        gateway,
        Arc::new(Mutex::new(store)),
        config.extractor.clone(),
    ));

    let state = AppState {
        extractor,
        providers,
        provider_choice,
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert!(config.extractor.validate().is_ok());
    }
}
