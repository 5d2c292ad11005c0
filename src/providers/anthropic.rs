use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{read_body, send_error, CompletionRequest, CompletionResponse, Provider, RetryPolicy};
use crate::errors::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic client for interacting with Anthropic API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (defaults to public API)
    endpoint: String,
    retry: RetryPolicy,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    pub fn from_completion(request: &CompletionRequest) -> Self {
        // The Messages API has no JSON mode; the system prompt asks for JSON instead
        Self {
            model: request.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            }],
            system: (!request.system.is_empty()).then(|| request.system.clone()),
            temperature: request.temperature,
            max_tokens: if request.max_tokens > 0 {
                request.max_tokens
            } else {
                DEFAULT_MAX_TOKENS
            },
        }
    }
}

impl AnthropicResponse {
    /// Concatenated text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64, retry: RetryPolicy) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: if endpoint.trim().is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
            retry,
        }
    }

    async fn send_once(&self, body: &AnthropicRequest) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| send_error("Anthropic", e))?;
        let text = read_body("Anthropic", response).await?;
        let parsed: AnthropicResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::ParseError(format!("Anthropic response: {}", e)))?;
        Ok(CompletionResponse { text: parsed.text() })
    }
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = AnthropicRequest::from_completion(&request);
        debug!("Anthropic request to model {}", request.model);
        self.retry.run("Anthropic", || self.send_once(&body)).await
    }

    /// Send a minimal message; there is no cheaper authenticated endpoint
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let body = AnthropicRequest {
            model: "claude-3-haiku-20240307".to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            system: None,
            temperature: 0.0,
            max_tokens: 10,
        };
        self.send_once(&body).await.map(|_| ())
    }
}
