/*!
 * Tests for provider clients and the shared retry policy
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use slidetran::errors::ProviderError;
use slidetran::providers::anthropic::Anthropic;
use slidetran::providers::mock::MockProvider;
use slidetran::providers::ollama::{normalize_endpoint, Ollama};
use slidetran::providers::openai::OpenAI;
use slidetran::providers::{CompletionRequest, Provider, RetryPolicy};

// Nothing listens on the discard port, so connections are refused right away
const CLOSED_ENDPOINT: &str = "http://127.0.0.1:9";

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "test-model".to_string(),
        system: "Translate.".to_string(),
        user: "Translate these items:\n{\"item_0\": \"Hi\"}".to_string(),
        temperature: 0.3,
        json_output: true,
        max_tokens: 256,
    }
}

#[test]
fn test_is_transient_withStatusCodes_shouldOnlyRetryServerErrors() {
    let server = ProviderError::ApiError {
        status_code: 503,
        message: "busy".to_string(),
    };
    let client = ProviderError::ApiError {
        status_code: 400,
        message: "bad request".to_string(),
    };
    assert!(server.is_transient());
    assert!(!client.is_transient());
    assert!(ProviderError::RateLimitExceeded("slow down".to_string()).is_transient());
    assert!(ProviderError::ConnectionError("reset".to_string()).is_transient());
    assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_transient());
    assert!(!ProviderError::ParseError("garbage".to_string()).is_transient());
}

#[tokio::test]
async fn test_run_withPersistentTransientError_shouldStopAfterMaxRetries() {
    let calls = AtomicUsize::new(0);
    let policy = RetryPolicy::new(2, 1);

    let result: Result<(), ProviderError> = policy
        .run("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::RateLimitExceeded("429".to_string()))
        })
        .await;

    assert!(matches!(result, Err(ProviderError::RateLimitExceeded(_))));
    // First attempt plus two retries
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_openai_complete_withClosedEndpoint_shouldReportConnectionError() {
    let provider = OpenAI::new("sk-test", CLOSED_ENDPOINT, 5, RetryPolicy::new(0, 1));

    let result = provider.complete(request()).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

#[tokio::test]
async fn test_anthropic_complete_withClosedEndpoint_shouldReportConnectionError() {
    let provider = Anthropic::new("key", CLOSED_ENDPOINT, 5, RetryPolicy::new(0, 1));

    let result = provider.complete(request()).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

#[tokio::test]
async fn test_ollama_test_connection_withClosedEndpoint_shouldFail() {
    let provider = Ollama::new(CLOSED_ENDPOINT, 5, RetryPolicy::new(0, 1)).unwrap();

    assert!(provider.test_connection().await.is_err());
    assert_eq!(provider.base_url(), "http://127.0.0.1:9");
}

#[test]
fn test_normalize_endpoint_withHttps_shouldDefaultTo443() {
    assert_eq!(normalize_endpoint("https://ollama.internal").unwrap(), "https://ollama.internal:443");
}

#[test]
fn test_openai_with_label_shouldRenameProvider() {
    let provider = OpenAI::new("", "http://localhost:1234/v1/", 5, RetryPolicy::default()).with_label("LM Studio");

    assert_eq!(provider.name(), "LM Studio");
    assert_eq!(provider.endpoint(), "http://localhost:1234/v1");
}

#[tokio::test]
async fn test_mock_test_connection_withFailingProvider_shouldFail() {
    assert!(MockProvider::failing().test_connection().await.is_err());
    assert!(MockProvider::working().test_connection().await.is_ok());
}
