/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Answers every item with a tagged "translation"
 * - `MockProvider::fixed(body)` - Always answers with the same body
 * - `MockProvider::missing_keys(..)` - Leaves the given items out of the answer
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::intermittent(n)` - Fails every n-th request
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};
use crate::translation::prompts::{item_key, payload_of};

/// Prefix the working mock puts in front of each source text
pub const MOCK_TRANSLATION_PREFIX: &str = "[ZH] ";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Translates every item of the payload
    Working,
    /// Returns this body verbatim
    Fixed(String),
    /// Like `Working`, but omits the items at these positions
    MissingKeys(Vec<usize>),
    /// Always fails with an error
    Failing,
    /// Fails every Nth request, works otherwise
    Intermittent { fail_every: usize },
    /// Returns an empty response
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Shared between clones
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn fixed(body: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fixed(body.into()))
    }

    pub fn missing_keys(positions: &[usize]) -> Self {
        Self::new(MockBehavior::MissingKeys(positions.to_vec()))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copies of all requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }

    /// The translation the working mock produces for `source`
    pub fn expected_translation(source: &str) -> String {
        format!("{}{}", MOCK_TRANSLATION_PREFIX, source)
    }

    /// Answer every payload item except those at `skip`
    fn translate_payload(request: &CompletionRequest, skip: &[usize]) -> Result<String, ProviderError> {
        let payload = payload_of(&request.user)
            .ok_or_else(|| ProviderError::RequestFailed("request has no item payload".to_string()))?;
        let items: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(payload).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let mut answer = serde_json::Map::new();
        for index in 0..items.len() {
            if skip.contains(&index) {
                continue;
            }
            let key = item_key(index);
            if let Some(source) = items.get(&key).and_then(|value| value.as_str()) {
                answer.insert(key, serde_json::Value::String(Self::expected_translation(source)));
            }
        }
        Ok(serde_json::Value::Object(answer).to_string())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let text = match &self.behavior {
            MockBehavior::Working => Self::translate_payload(&request, &[])?,
            MockBehavior::Fixed(body) => body.clone(),
            MockBehavior::MissingKeys(positions) => Self::translate_payload(&request, positions)?,
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "Simulated provider failure".to_string(),
                });
            }
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    return Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    });
                }
                Self::translate_payload(&request, &[])?
            }
            MockBehavior::Empty => String::new(),
        };
        Ok(CompletionResponse { text })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }
}
