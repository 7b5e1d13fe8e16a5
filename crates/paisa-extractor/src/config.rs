//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a statement upload does to the user's existing transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPolicy {
    /// New transactions are added alongside existing history
    Append,
    /// Existing transactions are cleared before inserting the new set
    /// ("statement replaces history")
    Replace,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        UploadPolicy::Append
    }
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Caller-facing content ceiling (characters); caps worst-case cost
    pub max_content_length: usize,

    /// Minimum trimmed content length for a plausible statement
    pub min_content_length: usize,

    /// Estimated-token threshold above which content is chunked
    pub max_tokens_per_request: usize,

    /// Token budget per chunk, including the reserved margin
    pub max_tokens_per_chunk: usize,

    /// Tokens reserved per chunk for prompt scaffolding and the response
    pub reserved_tokens: usize,

    /// Maximum time for a single provider call (seconds)
    pub extraction_timeout_secs: u64,

    /// Pacing delay between successive chunk calls (milliseconds)
    pub chunk_pacing_ms: u64,

    /// Backoff before the single per-chunk retry on rate limit (seconds)
    pub rate_limit_backoff_secs: u64,

    /// Keywords that gate the statement heuristic; any one match passes.
    /// A tunable list, not a correctness guarantee.
    pub statement_keywords: Vec<String>,

    /// Append or replace the user's history on upload
    pub upload_policy: UploadPolicy,
}

fn default_keywords() -> Vec<String> {
    [
        "kotak", "hdfc", "icici", "sbi", "axis", "bank", "upi", "transaction",
        "statement", "account", "balance", "credit", "debit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_content_length: 500_000,
            min_content_length: 10,
            max_tokens_per_request: 8_000,
            max_tokens_per_chunk: 8_000,
            reserved_tokens: 2_000,
            extraction_timeout_secs: 120,
            chunk_pacing_ms: 1_000,
            rate_limit_backoff_secs: 10,
            statement_keywords: default_keywords(),
            upload_policy: UploadPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Get the inter-chunk pacing delay as a Duration
    pub fn chunk_pacing(&self) -> Duration {
        Duration::from_millis(self.chunk_pacing_ms)
    }

    /// Get the rate-limit backoff as a Duration
    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_content_length == 0 {
            return Err("max_content_length must be greater than 0".to_string());
        }
        if self.max_tokens_per_chunk == 0 {
            return Err("max_tokens_per_chunk must be greater than 0".to_string());
        }
        if self.reserved_tokens >= self.max_tokens_per_chunk {
            return Err("reserved_tokens must be less than max_tokens_per_chunk".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.statement_keywords.is_empty() {
            return Err("statement_keywords must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_policy_is_append() {
        assert_eq!(ExtractorConfig::default().upload_policy, UploadPolicy::Append);
    }

    #[test]
    fn test_reserved_tokens_must_fit() {
        let mut config = ExtractorConfig::default();
        config.reserved_tokens = config.max_tokens_per_chunk;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut config = ExtractorConfig::default();
        config.statement_keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.max_content_length, parsed.max_content_length);
        assert_eq!(config.max_tokens_per_chunk, parsed.max_tokens_per_chunk);
        assert_eq!(config.upload_policy, parsed.upload_policy);
        assert_eq!(config.statement_keywords, parsed.statement_keywords);
    }

    #[test]
    fn test_replace_policy_toml_name() {
        let toml_str = ExtractorConfig {
            upload_policy: UploadPolicy::Replace,
            ..ExtractorConfig::default()
        }
        .to_toml()
        .unwrap();
        assert!(toml_str.contains("upload_policy = \"replace\""));
    }
}
