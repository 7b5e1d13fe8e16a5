//! Per-chunk retry policy
//!
//! Retries are narrow: only a rate-limited chunk call is retried, once,
//! after a fixed backoff. Everything else fails the chunk immediately and
//! the orchestrator decides whether to skip it or abort.

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use std::time::Duration;

/// Retry policy for a single chunk call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per chunk, first try included
    pub max_attempts: u32,
    /// Delay before a retry
    pub backoff: Duration,
    /// Only rate-limit errors are retryable when set
    pub retry_on_rate_limit: bool,
}

impl RetryPolicy {
    /// Build the policy from pipeline configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            max_attempts: 2,
            backoff: config.rate_limit_backoff(),
            retry_on_rate_limit: true,
        }
    }

    /// Whether the given failure on the given one-based attempt warrants
    /// another try
    pub fn should_retry(&self, error: &ExtractError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        self.retry_on_rate_limit && error.is_rate_limited()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable_once() {
        let policy = RetryPolicy::default();
        let err = ExtractError::RateLimited("429".to_string());

        assert!(policy.should_retry(&err, 1));
        assert!(!policy.should_retry(&err, 2));
    }

    #[test]
    fn test_other_errors_are_not_retryable() {
        let policy = RetryPolicy::default();

        assert!(!policy.should_retry(&ExtractError::Timeout, 1));
        assert!(!policy.should_retry(&ExtractError::Llm("boom".to_string()), 1));
        assert!(!policy.should_retry(&ExtractError::EmptyResult, 1));
    }

    #[test]
    fn test_backoff_follows_config() {
        let mut config = ExtractorConfig::default();
        config.rate_limit_backoff_secs = 3;
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.backoff, Duration::from_secs(3));
    }
}
