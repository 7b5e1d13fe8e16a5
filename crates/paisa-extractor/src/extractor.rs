//! Statement extraction orchestrator
//!
//! Ties the pipeline together: validate, choose single-shot or chunked
//! processing, call the provider gateway, parse and repair the output,
//! deduplicate across chunks, and hand the survivors to the materializer.
//!
//! Chunks are processed strictly sequentially with a pacing delay between
//! calls. A rate-limited chunk gets one backoff-then-retry; a chunk that
//! still fails is skipped, and only a batch where every chunk produced
//! nothing aborts the upload.

use crate::chunking::ContentChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::materializer::{MaterializeOutcome, Materializer};
use crate::parser::parse_response;
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::retry::RetryPolicy;
use crate::tokens::estimate_tokens;
use crate::types::{ExtractionRequest, RawTransaction};
use crate::validate::StatementValidator;
use paisa_domain::TransactionStore;
use paisa_llm::{ChatCompleter, ChatRequest, ProviderChoice, ProviderGateway, ProviderName};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Result of a completed statement extraction
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Provider that served the final successful call
    pub provider: ProviderName,
    /// Number of chunks the content was split into (1 for single-shot)
    pub chunks: usize,
    /// Duplicate candidates collapsed across chunks
    pub deduplicated: usize,
    /// Persistence summary
    pub materialized: MaterializeOutcome,
}

/// The extraction pipeline, generic over the LLM backend and the store
pub struct StatementExtractor<C, S> {
    gateway: ProviderGateway<C>,
    store: Arc<Mutex<S>>,
    validator: StatementValidator,
    chunker: ContentChunker,
    retry: RetryPolicy,
    config: ExtractorConfig,
}

impl<C, S> StatementExtractor<C, S>
where
    C: ChatCompleter,
    S: TransactionStore,
    S::Error: Display,
{
    /// Create an extractor over a gateway and a shared store
    pub fn new(gateway: ProviderGateway<C>, store: Arc<Mutex<S>>, config: ExtractorConfig) -> Self {
        let validator = StatementValidator::from_config(&config);
        let chunker = ContentChunker::new(config.max_tokens_per_chunk, config.reserved_tokens);
        let retry = RetryPolicy::from_config(&config);
        Self {
            gateway,
            store,
            validator,
            chunker,
            retry,
            config,
        }
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Run the full pipeline for one statement upload
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractError> {
        self.validator.validate(&request.content)?;

        let tokens = estimate_tokens(&request.content);
        info!(
            user_id = %request.user_id,
            content_len = request.content.len(),
            estimated_tokens = tokens,
            "Starting statement extraction"
        );

        let (provider, chunks, candidates, deduplicated) =
            if tokens > self.config.max_tokens_per_request {
                self.extract_chunked(&request).await?
            } else {
                let (provider, candidates) = self.extract_single(&request).await?;
                (provider, 1, candidates, 0)
            };

        let materializer = Materializer::new(self.config.upload_policy);
        let materialized = {
            let mut store = self
                .store
                .lock()
                .map_err(|_| ExtractError::Store("store lock poisoned".to_string()))?;
            materializer.materialize(&mut *store, &request.user_id, candidates)?
        };

        info!(
            user_id = %request.user_id,
            provider = %provider,
            chunks,
            inserted = materialized.inserted(),
            "Statement extraction complete"
        );

        Ok(ExtractionOutcome {
            provider,
            chunks,
            deduplicated,
            materialized,
        })
    }

    /// One provider call for content that fits a single request
    async fn extract_single(
        &self,
        request: &ExtractionRequest,
    ) -> Result<(ProviderName, Vec<RawTransaction>), ExtractError> {
        let prompt = PromptBuilder::new(&request.content).build();
        let (provider, text) = self.call_model(&prompt, request.provider).await?;
        let candidates = parse_response(&text)?;
        Ok((provider, candidates))
    }

    /// Sequential per-chunk extraction with pacing, retry, and dedup
    async fn extract_chunked(
        &self,
        request: &ExtractionRequest,
    ) -> Result<(ProviderName, usize, Vec<RawTransaction>, usize), ExtractError> {
        let chunks = self.chunker.split(&request.content);
        let total = chunks.len();
        info!(total, "Content exceeds single-request budget, processing in chunks");

        let mut last_provider = None;
        let mut seen: HashSet<(String, String, u64)> = HashSet::new();
        let mut accepted: Vec<RawTransaction> = Vec::new();
        let mut deduplicated = 0;

        for chunk in chunks {
            let number = chunk.index + 1;
            if chunk.index > 0 && !self.config.chunk_pacing().is_zero() {
                tokio::time::sleep(self.config.chunk_pacing()).await;
            }

            let prompt = PromptBuilder::new(&chunk.text)
                .for_chunk(number, total)
                .build();

            match self.call_chunk(&prompt, request.provider, number, total).await {
                Ok((provider, candidates)) => {
                    last_provider = Some(provider);
                    for candidate in candidates {
                        if seen.insert(candidate.dedup_key()) {
                            accepted.push(candidate);
                        } else {
                            deduplicated += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(chunk = number, total, error = %e, "Chunk failed, skipping");
                }
            }
        }

        if accepted.is_empty() {
            return Err(ExtractError::NoTransactionsExtracted);
        }

        let provider = last_provider.ok_or(ExtractError::NoTransactionsExtracted)?;
        info!(
            total,
            extracted = accepted.len(),
            deduplicated,
            "Chunked extraction finished"
        );
        Ok((provider, total, accepted, deduplicated))
    }

    /// One chunk call with the narrow rate-limit retry
    async fn call_chunk(
        &self,
        prompt: &str,
        choice: ProviderChoice,
        number: usize,
        total: usize,
    ) -> Result<(ProviderName, Vec<RawTransaction>), ExtractError> {
        let mut attempt = 1;
        loop {
            debug!(chunk = number, total, attempt, "Processing chunk");
            let error = match self.call_model(prompt, choice).await {
                Ok((provider, text)) => match parse_response(&text) {
                    Ok(candidates) => return Ok((provider, candidates)),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            if self.retry.should_retry(&error, attempt) {
                warn!(
                    chunk = number,
                    backoff_secs = self.retry.backoff.as_secs(),
                    "Rate limited, backing off before retry"
                );
                tokio::time::sleep(self.retry.backoff).await;
                attempt += 1;
                continue;
            }

            return Err(error);
        }
    }

    /// One gateway call under the extraction timeout
    async fn call_model(
        &self,
        prompt: &str,
        choice: ProviderChoice,
    ) -> Result<(ProviderName, String), ExtractError> {
        let chat = ChatRequest::extraction(SYSTEM_PROMPT, prompt);
        let output = tokio::time::timeout(
            self.config.extraction_timeout(),
            self.gateway.complete(&chat, choice),
        )
        .await
        .map_err(|_| ExtractError::Timeout)??;

        Ok((output.provider, output.text))
    }
}
