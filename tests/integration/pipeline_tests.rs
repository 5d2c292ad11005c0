/*!
 * End-to-end tests: folder runs through locate, translate, reinsert and persist
 */

use anyhow::Result;
use std::fs;

use slidetran::app_controller::{Controller, DocumentOutcome};
use slidetran::deck::{Presentation, ShapeKind};
use slidetran::providers::mock::MockProvider;
use slidetran::slides::locate_text_units;

use crate::common::{
    self, linked_paragraph, mock_service, paragraph, picture_shape, styled_paragraph, table_shape, text_shape,
    DeckBuilder,
};

fn sample_deck() -> DeckBuilder {
    DeckBuilder::new()
        .slide(vec![
            text_shape(2, &[styled_paragraph("Welcome"), paragraph("Agenda")]),
            picture_shape(3),
        ])
        .slide_with_links(
            vec![
                table_shape(2, &[&["Metric", "Value"], &["Users", ""]]),
                text_shape(3, &[linked_paragraph("https://example.com", "rId2"), paragraph("Questions?")]),
            ],
            &[("rId2", "https://example.com")],
        )
}

#[tokio::test]
async fn test_run_folder_withSampleDeck_shouldTranslateEveryUnitInPlace() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let source_path = sample_deck().write_to(input.path(), "talk.pptx")?;
    let provider = MockProvider::working();
    let controller = Controller::with_service(
        common::test_config(input.path(), output.path()),
        mock_service(provider.clone()),
    )
    .without_progress();

    let summary = controller.run_folder().await;

    assert_eq!(summary.persisted_count(), 1);
    assert_eq!(summary.failed_count(), 0);
    let expected_path = output.path().join("talk_cn.pptx");
    assert_eq!(
        summary.outcomes,
        vec![(source_path.clone(), DocumentOutcome::Persisted(expected_path.clone()))]
    );

    let source = Presentation::open(&source_path)?;
    let translated = Presentation::open(&expected_path)?;
    let before = locate_text_units(&source);
    let after = locate_text_units(&translated);

    // Same positions, each text replaced by its own translation
    assert_eq!(before.contents, vec!["Welcome", "Agenda", "Metric", "Value", "Users", "Questions?"]);
    assert_eq!(after.locations, before.locations);
    let expected: Vec<String> = before
        .contents
        .iter()
        .map(|text| MockProvider::expected_translation(text))
        .collect();
    assert_eq!(after.contents, expected);

    // One request for six units with the default batch size
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withHyperlink_shouldLeaveLinkedTextUntouched() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    sample_deck().write_to(input.path(), "talk.pptx")?;
    let controller = Controller::with_service(
        common::test_config(input.path(), output.path()),
        mock_service(MockProvider::working()),
    )
    .without_progress();

    controller.run_folder().await;

    let translated = Presentation::open(output.path().join("talk_cn.pptx"))?;
    let shapes = translated.slides()[1].shapes();
    let ShapeKind::PlainText(frame) = shapes[1].kind() else {
        panic!("expected a text shape");
    };
    let paragraphs = frame.paragraphs();
    assert_eq!(paragraphs[0].text(), "https://example.com");
    assert_eq!(paragraphs[1].text(), MockProvider::expected_translation("Questions?"));
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withSmallBatches_shouldKeepOrderAcrossBatches() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let lines: Vec<String> = (0..7).map(|i| paragraph(&format!("Line {}", i))).collect();
    DeckBuilder::new().slide(vec![text_shape(2, &lines)]).write_to(input.path(), "long.pptx")?;
    let mut config = common::test_config(input.path(), output.path());
    config.translation.common.batch_size = 3;
    let provider = MockProvider::working();
    let controller = Controller::with_service(config, mock_service(provider.clone())).without_progress();

    let summary = controller.run_folder().await;

    assert_eq!(summary.persisted_count(), 1);
    assert_eq!(provider.request_count(), 3);
    let translated = Presentation::open(output.path().join("long_cn.pptx"))?;
    let after = locate_text_units(&translated);
    let expected: Vec<String> = (0..7)
        .map(|i| MockProvider::expected_translation(&format!("Line {}", i)))
        .collect();
    assert_eq!(after.contents, expected);
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withMixedInputs_shouldContinuePastFailures() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_test_file(input.path(), "a_broken.pptx", b"this is not a presentation")?;
    DeckBuilder::new()
        .slide(vec![picture_shape(2)])
        .write_to(input.path(), "b_pictures.pptx")?;
    sample_deck().write_to(input.path(), "c_talk.pptx")?;
    common::create_test_file(input.path(), "readme.txt", b"ignored")?;
    let controller = Controller::with_service(
        common::test_config(input.path(), output.path()),
        mock_service(MockProvider::working()),
    )
    .without_progress();

    let summary = controller.run_folder().await;

    assert_eq!(summary.outcomes.len(), 3);
    assert!(matches!(summary.outcomes[0].1, DocumentOutcome::Failed(_)));
    assert_eq!(summary.outcomes[1].1, DocumentOutcome::Skipped);
    assert!(matches!(summary.outcomes[2].1, DocumentOutcome::Persisted(_)));

    // Only the translated deck produces output
    let written: Vec<String> = fs::read_dir(output.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(written, vec!["c_talk_cn.pptx"]);
    Ok(())
}

#[tokio::test]
async fn test_process_document_withFailingProvider_shouldFailWithoutOutput() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let path = sample_deck().write_to(input.path(), "talk.pptx")?;
    let controller = Controller::with_service(
        common::test_config(input.path(), output.path()),
        mock_service(MockProvider::failing()),
    )
    .without_progress();

    let outcome = controller.process_document(&path).await;

    assert!(matches!(outcome, DocumentOutcome::Failed(ref reason) if reason.contains("500")));
    assert!(!output.path().join("talk_cn.pptx").exists());
    Ok(())
}

#[tokio::test]
async fn test_process_document_withMissingKeys_shouldKeepSourceForThoseUnits() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let path = DeckBuilder::new()
        .slide(vec![text_shape(2, &[paragraph("A"), paragraph("B"), paragraph("C")])])
        .write_to(input.path(), "abc.pptx")?;
    let controller = Controller::with_service(
        common::test_config(input.path(), output.path()),
        mock_service(MockProvider::fixed(r#"{"item_0": "甲", "item_2": "丙"}"#)),
    )
    .without_progress();

    let outcome = controller.process_document(&path).await;

    let saved = match outcome {
        DocumentOutcome::Persisted(saved) => saved,
        other => panic!("expected the document to be saved, got {:?}", other),
    };
    let translated = Presentation::open(saved)?;
    assert_eq!(locate_text_units(&translated).contents, vec!["甲", "B", "丙"]);
    Ok(())
}

#[tokio::test]
async fn test_run_folder_withMissingInputDir_shouldReturnEmptySummary() -> Result<()> {
    let output = common::create_temp_dir()?;
    let missing = output.path().join("does-not-exist");
    let controller = Controller::with_service(
        common::test_config(&missing, output.path()),
        mock_service(MockProvider::working()),
    )
    .without_progress();

    let summary = controller.run_folder().await;

    assert!(summary.is_empty());
    Ok(())
}
