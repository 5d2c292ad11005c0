/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, the client that turns one batch
 * of source strings into a batch of translations of the same length. The
 * provider is an explicit dependency so tests can substitute a mock.
 */

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::prompts::{item_key, PromptTemplate, TranslationPromptBuilder};
use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{AppError, ProviderError, TranslationError};
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider};

/// Create the provider client selected by the configuration
pub fn create_provider(config: &TranslationConfig) -> Result<Arc<dyn Provider>, AppError> {
    let retry = config.retry_policy();
    let timeout_secs = config.get_timeout_secs();
    let endpoint = config.get_endpoint();

    let provider: Arc<dyn Provider> = match config.provider {
        ConfigTranslationProvider::OpenAI => {
            Arc::new(OpenAI::new(config.get_api_key(), endpoint, timeout_secs, retry))
        }
        ConfigTranslationProvider::LMStudio => {
            // LM Studio often doesn't require an API key
            Arc::new(OpenAI::new(config.get_api_key(), endpoint, timeout_secs, retry).with_label("LM Studio"))
        }
        ConfigTranslationProvider::Ollama => Arc::new(
            Ollama::new(&endpoint, timeout_secs, retry).map_err(|e| AppError::Config(e.to_string()))?,
        ),
        ConfigTranslationProvider::Anthropic => {
            Arc::new(Anthropic::new(config.get_api_key(), endpoint, timeout_secs, retry))
        }
    };
    Ok(provider)
}

/// Translation client for batches of slide text
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    prompt: PromptTemplate,
}

impl TranslationService {
    /// Wrap an existing provider with default request settings
    pub fn with_provider(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: 4096,
            prompt: PromptTemplate::default(),
        }
    }

    /// Build the service and its provider from configuration
    pub fn from_config(config: &TranslationConfig) -> Result<Self, AppError> {
        let provider = create_provider(config)?;
        Ok(Self::with_settings(provider, config))
    }

    /// Use `provider` with the request settings from configuration
    pub fn with_settings(provider: Arc<dyn Provider>, config: &TranslationConfig) -> Self {
        let prompt = if config.common.system_prompt.trim().is_empty() {
            PromptTemplate::default()
        } else {
            PromptTemplate::new(&config.common.system_prompt)
        };
        Self {
            provider,
            model: config.get_model(),
            temperature: config.common.temperature,
            max_tokens: config.common.max_tokens,
            prompt,
        }
    }

    pub fn system_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        info!("Testing connection to {} with model {}", self.provider.name(), self.model);
        self.provider.test_connection().await
    }

    /// Translate one batch. The result always has `sources.len()` entries.
    ///
    /// Missing or unusable items fall back to their source text with a warning;
    /// only a failed request or an unparseable answer is an error.
    pub async fn translate_batch(&self, sources: &[String]) -> Result<Vec<String>, TranslationError> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            system: self.prompt.as_str().to_string(),
            user: TranslationPromptBuilder::new().with_items(sources).build_user_message(),
            temperature: self.temperature,
            json_output: true,
            max_tokens: self.max_tokens,
        };

        let start_time = Instant::now();
        let response = self.provider.complete(request).await?;
        debug!(
            "{} answered a batch of {} items in {:?}",
            self.provider.name(),
            sources.len(),
            start_time.elapsed()
        );

        if response.text.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        let items = parse_response(&response.text)?;
        Ok(reconcile(sources, &items))
    }
}

/// Parse a provider answer into a key -> value object.
///
/// A Markdown code fence around the object is tolerated.
pub fn parse_response(text: &str) -> Result<serde_json::Map<String, serde_json::Value>, TranslationError> {
    let body = strip_code_fence(text.trim());
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        TranslationError::MalformedResponse(format!(
            "{} (response starts with: {})",
            e,
            body.chars().take(120).collect::<String>()
        ))
    })?;
    match value {
        serde_json::Value::Object(items) => Ok(items),
        other => Err(TranslationError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Line up provider items with the sources, one output per source.
///
/// `item_i` present as a string: its trimmed value. Missing or not a string: the
/// source text, with a warning. Keys outside `item_0..item_{n-1}` are ignored.
pub fn reconcile(sources: &[String], items: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    let translations: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let key = item_key(index);
            match items.get(&key) {
                Some(serde_json::Value::String(text)) => text.trim().to_string(),
                Some(other) => {
                    warn!("Translation for {} is {}, keeping source text", key, json_kind(other));
                    source.clone()
                }
                None => {
                    warn!("Translation for {} missing from response, keeping source text", key);
                    source.clone()
                }
            }
        })
        .collect();

    let extra = items
        .keys()
        .filter(|key| {
            key.strip_prefix("item_")
                .and_then(|n| n.parse::<usize>().ok())
                .map(|n| n >= sources.len())
                .unwrap_or(true)
        })
        .count();
    if extra > 0 {
        debug!("Ignored {} unexpected keys in translation response", extra);
    }

    translations
}
