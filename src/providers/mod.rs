/*!
 * Provider implementations for different completion services.
 *
 * This module contains client implementations for the LLM providers that can
 * translate a batch:
 * - OpenAI: OpenAI Chat Completions API (also used for LM Studio)
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic Messages API
 * - Mock: deterministic in-process provider for tests
 *
 * All providers share one request/response shape and one retry policy, so the
 * translation client can hold any of them as `Arc<dyn Provider>`.
 */

use async_trait::async_trait;
use log::{error, warn};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

/// One chat-style completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name as the provider knows it
    pub model: String,
    /// System instruction
    pub system: String,
    /// User message
    pub user: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object instead of free text
    pub json_output: bool,
    pub max_tokens: u32,
}

/// The text a provider answered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation client.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Retry with exponential backoff for transient provider errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, provider: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} request failed: {} - retry {}/{} in {:?}",
                        provider, e, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a send failure from reqwest
pub(crate) fn send_error(provider: &str, e: reqwest::Error) -> ProviderError {
    if e.is_builder() {
        ProviderError::RequestFailed(format!("{}: {}", provider, e))
    } else {
        ProviderError::ConnectionError(format!("Failed to send request to {}: {}", provider, e))
    }
}

/// Read the body of a response, turning non-success statuses into errors
pub(crate) async fn read_body(provider: &str, response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::ConnectionError(format!("Failed to read {} response: {}", provider, e)))?;
    if status.is_success() {
        return Ok(body);
    }

    error!("{} API error ({}): {}", provider, status, body);
    Err(match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        status_code => ProviderError::ApiError {
            status_code,
            message: body,
        },
    })
}
