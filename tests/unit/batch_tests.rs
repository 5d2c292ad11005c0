/*!
 * Tests for batching of whole documents
 */

use std::sync::Mutex;
use std::time::Duration;

use slidetran::app_config::{BatchFailurePolicy, TranslationCommonConfig};
use slidetran::errors::TranslationError;
use slidetran::providers::mock::MockProvider;
use slidetran::translation::{split_into_batches, BatchTranslator};

use crate::common::mock_service;

fn texts(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Text {}", i)).collect()
}

#[test]
fn test_split_into_batches_withSeventyItems_shouldGiveThirtyThirtyTen() {
    let items = texts(70);

    let batches = split_into_batches(&items, 30);

    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![30, 30, 10]);
    let rejoined: Vec<String> = batches.concat();
    assert_eq!(rejoined, items);
}

#[tokio::test]
async fn test_translate_all_withSeveralBatches_shouldPreserveOrderAndLength() {
    let provider = MockProvider::working();
    let translator = BatchTranslator::new(mock_service(provider.clone()), 3, Duration::ZERO);
    let input = texts(8);

    let translated = translator.translate_all(&input, |_, _| {}).await.unwrap();

    assert_eq!(translated.len(), input.len());
    for (source, translation) in input.iter().zip(&translated) {
        assert_eq!(translation, &MockProvider::expected_translation(source));
    }
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_translate_all_shouldReportProgressAfterEachBatch() {
    let translator = BatchTranslator::new(mock_service(MockProvider::working()), 2, Duration::ZERO);
    let progress = Mutex::new(Vec::new());

    translator
        .translate_all(&texts(5), |done, total| progress.lock().unwrap().push((done, total)))
        .await
        .unwrap();

    assert_eq!(progress.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_translate_all_withFailureAndAbortPolicy_shouldFail() {
    let translator = BatchTranslator::new(mock_service(MockProvider::intermittent(2)), 1, Duration::ZERO);

    let result = translator.translate_all(&texts(3), |_, _| {}).await;

    assert!(matches!(result, Err(TranslationError::Provider(_))));
}

#[tokio::test]
async fn test_translate_all_withFailureAndKeepSourcePolicy_shouldKeepFailedBatch() {
    let translator = BatchTranslator::new(mock_service(MockProvider::intermittent(2)), 1, Duration::ZERO)
        .with_failure_policy(BatchFailurePolicy::KeepSource);
    let input = texts(3);

    let translated = translator.translate_all(&input, |_, _| {}).await.unwrap();

    assert_eq!(
        translated,
        vec![
            MockProvider::expected_translation("Text 0"),
            "Text 1".to_string(),
            MockProvider::expected_translation("Text 2"),
        ]
    );
}

#[tokio::test]
async fn test_translate_all_withEmptyInput_shouldNotCallProvider() {
    let provider = MockProvider::working();
    let translator = BatchTranslator::new(mock_service(provider.clone()), 30, Duration::from_millis(500));

    let translated = translator.translate_all(&[], |_, _| {}).await.unwrap();

    assert!(translated.is_empty());
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_translate_all_withPause_shouldWaitBetweenBatches() {
    let translator = BatchTranslator::new(mock_service(MockProvider::working()), 2, Duration::from_millis(50));
    let start = std::time::Instant::now();

    translator.translate_all(&texts(6), |_, _| {}).await.unwrap();

    // Three batches, two pauses
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
fn test_from_config_withZeroBatchSize_shouldUseOne() {
    let common = TranslationCommonConfig {
        batch_size: 0,
        ..TranslationCommonConfig::default()
    };

    let translator = BatchTranslator::from_config(mock_service(MockProvider::working()), &common);

    assert_eq!(translator.batch_size(), 1);
}
