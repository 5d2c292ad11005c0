/*!
 * Tests for the batch translation client
 */

use std::sync::Arc;

use slidetran::app_config::{Config, TranslationProvider};
use slidetran::errors::{ProviderError, TranslationError};
use slidetran::providers::mock::MockProvider;
use slidetran::translation::core::{parse_response, reconcile};
use slidetran::translation::prompts::{payload_of, USER_MESSAGE_PREFIX};
use slidetran::translation::{create_provider, PromptTemplate, TranslationService};

use crate::common::mock_service;

fn sources(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_translate_batch_withWorkingProvider_shouldReturnOnePerSource() {
    let service = mock_service(MockProvider::working());
    let input = sources(&["Hello", "Save changes", "Cancel"]);

    let translated = service.translate_batch(&input).await.unwrap();

    assert_eq!(translated.len(), input.len());
    assert_eq!(translated[1], MockProvider::expected_translation("Save changes"));
}

#[tokio::test]
async fn test_translate_batch_withMissingKeys_shouldKeepSourceText() {
    let provider = MockProvider::fixed(r#"{"item_0": "甲", "item_2": "丙"}"#);
    let service = mock_service(provider);

    let translated = service.translate_batch(&sources(&["A", "B", "C"])).await.unwrap();

    assert_eq!(translated, vec!["甲", "B", "丙"]);
}

#[tokio::test]
async fn test_translate_batch_withFencedAnswer_shouldParseBody() {
    let provider = MockProvider::fixed("```json\n{\"item_0\": \"  你好  \"}\n```");
    let service = mock_service(provider);

    let translated = service.translate_batch(&sources(&["Hello"])).await.unwrap();

    assert_eq!(translated, vec!["你好"]);
}

#[tokio::test]
async fn test_translate_batch_withNonObjectAnswer_shouldBeMalformed() {
    let service = mock_service(MockProvider::fixed(r#"["甲", "乙"]"#));

    let result = service.translate_batch(&sources(&["A", "B"])).await;

    assert!(matches!(result, Err(TranslationError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_translate_batch_withEmptyAnswer_shouldReportEmptyResponse() {
    let service = mock_service(MockProvider::empty());

    let result = service.translate_batch(&sources(&["A"])).await;

    assert!(matches!(result, Err(TranslationError::EmptyResponse)));
}

#[tokio::test]
async fn test_translate_batch_withFailingProvider_shouldPropagateProviderError() {
    let service = mock_service(MockProvider::failing());

    let result = service.translate_batch(&sources(&["A"])).await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ApiError { status_code: 500, .. }))
    ));
}

#[tokio::test]
async fn test_translate_batch_withEmptyInput_shouldNotCallProvider() {
    let provider = MockProvider::working();
    let service = mock_service(provider.clone());

    let translated = service.translate_batch(&[]).await.unwrap();

    assert!(translated.is_empty());
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_batch_shouldSendInstructionAndKeyedPayload() {
    let provider = MockProvider::working();
    let service = TranslationService::with_provider(Arc::new(provider.clone()), "gpt-4o")
        .temperature(0.1)
        .system_prompt(PromptTemplate::new("Translate to Chinese."));

    service.translate_batch(&sources(&["Open", "Close"])).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.system, "Translate to Chinese.");
    assert!(request.json_output);
    assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    assert!(request.user.starts_with(USER_MESSAGE_PREFIX));

    let payload: serde_json::Value = serde_json::from_str(payload_of(&request.user).unwrap()).unwrap();
    assert_eq!(payload["item_0"], "Open");
    assert_eq!(payload["item_1"], "Close");
}

#[test]
fn test_default_prompt_shouldDemandJsonWithSameKeys() {
    let prompt = PromptTemplate::default();
    assert!(prompt.as_str().contains("Simplified Chinese"));
    assert!(prompt.as_str().contains("JSON"));
}

#[test]
fn test_reconcile_withExtraKeys_shouldIgnoreThem() {
    let items = parse_response(r#"{"item_0": "一", "item_5": "六", "comment": "done"}"#).unwrap();

    let translated = reconcile(&sources(&["one"]), &items);

    assert_eq!(translated, vec!["一"]);
}

#[test]
fn test_create_provider_withEachProvider_shouldUseItsName() {
    let mut config = Config::default();
    for (provider, name) in [
        (TranslationProvider::OpenAI, "OpenAI"),
        (TranslationProvider::LMStudio, "LM Studio"),
        (TranslationProvider::Ollama, "Ollama"),
        (TranslationProvider::Anthropic, "Anthropic"),
    ] {
        config.translation.provider = provider;
        let created = create_provider(&config.translation).unwrap();
        assert_eq!(created.name(), name);
    }
}
