use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{read_body, send_error, CompletionRequest, CompletionResponse, Provider, RetryPolicy};
use crate::errors::ProviderError;

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    retry: RetryPolicy,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    /// `"json"` constrains the output to a JSON value
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

/// Model parameters
#[derive(Debug, Serialize)]
pub struct ChatOptions {
    temperature: f32,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat response (non-streaming)
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

impl ChatRequest {
    pub fn from_completion(request: &CompletionRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            format: request.json_output.then(|| "json".to_string()),
            stream: false,
            options: Some(ChatOptions {
                temperature: request.temperature,
                num_predict: (request.max_tokens > 0).then_some(request.max_tokens),
            }),
        }
    }
}

/// Normalize an endpoint like `localhost:11434` or `http://host` into a base URL
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Ok(DEFAULT_ENDPOINT.to_string());
    }
    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid Ollama endpoint '{}': {}", endpoint, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| ProviderError::RequestFailed(format!("Invalid host in endpoint: {}", endpoint)))?;
    let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 11434 });
    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

/// Join the content of a streamed (JSONL) chat answer
fn collect_streamed_content(body: &str) -> Option<String> {
    let mut content = String::new();
    let mut seen = false;
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        if let Some(part) = value
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            content.push_str(part);
            seen = true;
        }
    }
    seen.then_some(content)
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(endpoint: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: normalize_endpoint(endpoint)?,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama speaks HTTP/1.1
                .http1_only()
                .build()
                .unwrap_or_default(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat_once(&self, body: &ChatRequest) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?;
        let text = read_body("Ollama", response).await?;

        match serde_json::from_str::<ChatResponse>(&text) {
            Ok(chat) => Ok(CompletionResponse {
                text: chat.message.content,
            }),
            Err(e) => {
                // Some servers stream even when asked not to
                collect_streamed_content(&text)
                    .map(|text| CompletionResponse { text })
                    .ok_or_else(|| {
                        error!(
                            "Failed to parse Ollama chat response: {}. Raw response (first 500 chars): {}",
                            e,
                            text.chars().take(500).collect::<String>()
                        );
                        ProviderError::ParseError(format!("Ollama chat response: {}", e))
                    })
            }
        }
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| send_error("Ollama", e))?;
        let body = read_body("Ollama", response).await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::ParseError(e.to_string()))?;
        value["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = ChatRequest::from_completion(&request);
        debug!("Ollama chat request to model {}", request.model);
        self.retry.run("Ollama", || self.chat_once(&body)).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }
}
