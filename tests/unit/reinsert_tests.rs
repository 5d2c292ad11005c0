/*!
 * Tests for reinsertion and formatting restore
 */

use anyhow::Result;
use std::io::{Cursor, Read};

use slidetran::deck::{Alignment, FontSize, Paragraph, Presentation, ShapeKind};
use slidetran::errors::{DeckError, LocationResolutionError, ReinsertError};
use slidetran::slides::reinsert::{resolve_paragraph, TARGET_LANGUAGE_TAG};
use slidetran::slides::{locate_text_units, FormattingSnapshot, Location, Reinserter};

use crate::common::{paragraph, styled_paragraph, table_shape, text_shape, DeckBuilder};

const FONT: &str = "Microsoft YaHei";

fn open(builder: DeckBuilder) -> Result<Presentation> {
    Ok(Presentation::from_reader(Cursor::new(builder.build()?))?)
}

fn reopen(deck: &Presentation) -> Result<Presentation> {
    Ok(Presentation::from_reader(Cursor::new(deck.to_bytes()?))?)
}

/// Run `check` against paragraph `index` of the first shape on slide 0
fn with_first_shape_paragraph(deck: &Presentation, index: usize, check: impl FnOnce(&Paragraph<'_>)) {
    let shapes = deck.slides()[0].shapes();
    let ShapeKind::PlainText(frame) = shapes[0].kind() else {
        panic!("expected a text shape");
    };
    let paragraphs = frame.paragraphs();
    check(&paragraphs[index]);
}

fn run_languages(paragraph: &Paragraph<'_>) -> Vec<Option<String>> {
    paragraph
        .element()
        .children_named("r")
        .map(|run| run.child("rPr").and_then(|props| props.attr("lang")).map(str::to_string))
        .collect()
}

#[test]
fn test_apply_translations_withStyledParagraph_shouldRestoreFormatting() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[styled_paragraph("Quarterly results")])]))?;
    let located = locate_text_units(&deck);

    let report = Reinserter::new(FONT).apply_translations(
        &mut deck,
        &located.locations,
        &["季度业绩".to_string()],
    )?;
    assert_eq!(report.paragraphs_written, 1);
    assert!(report.bullet_failures.is_empty());

    let reopened = reopen(&deck)?;
    with_first_shape_paragraph(&reopened, 0, |p| {
        assert_eq!(p.text(), "季度业绩");
        assert_eq!(p.alignment(), Some(Alignment::Center));
        assert_eq!(p.level(), Some(1));
        assert_eq!(p.indentation().margin_left, Some(742950));
        assert_eq!(p.indentation().indent, Some(-285750));
        assert_eq!(p.bullet_glyph().map(|g| g.local_name()), Some("buChar"));

        let runs = p.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].font_size(), Some(FontSize::from_points(24)));
        assert_eq!(
            runs[0].color().ok().flatten().map(|c| c.to_string()),
            Some("FF0000".to_string())
        );
        assert_eq!(runs[0].font_family(), Some(FONT));
        assert_eq!(runs[0].east_asian_font_family(), Some(FONT));
    });
    Ok(())
}

#[test]
fn test_apply_translations_withNewRuns_shouldTagTargetLanguage() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("Hello")])]))?;
    let located = locate_text_units(&deck);

    Reinserter::new(FONT).apply_translations(&mut deck, &located.locations, &["你好".to_string()])?;

    with_first_shape_paragraph(&deck, 0, |p| {
        assert_eq!(run_languages(p), vec![Some(TARGET_LANGUAGE_TAG.to_string())]);
        // Plain source run had no size or color, so none is invented
        assert_eq!(p.runs()[0].font_size(), None);
        assert!(matches!(p.runs()[0].color(), Ok(None)));
    });
    Ok(())
}

#[test]
fn test_apply_translations_withMultilineTranslation_shouldRestoreSizesByRunIndex() -> Result<()> {
    let two_runs = concat!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="2000"><a:solidFill><a:srgbClr val="1F4E79"/></a:solidFill></a:rPr><a:t>Big </a:t></a:r>"#,
        r#"<a:r><a:rPr lang="en-US" sz="1800"/><a:t>small</a:t></a:r></a:p>"#
    )
    .to_string();
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[two_runs])]))?;
    let located = locate_text_units(&deck);
    assert_eq!(located.contents, vec!["Big small"]);

    Reinserter::new(FONT).apply_translations(&mut deck, &located.locations, &["大\n小".to_string()])?;

    let reopened = reopen(&deck)?;
    with_first_shape_paragraph(&reopened, 0, |p| {
        assert_eq!(p.text(), "大\u{000B}小");
        let runs = p.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].font_size(), Some(FontSize::from_hundredths(2000)));
        assert_eq!(runs[1].font_size(), Some(FontSize::from_hundredths(1800)));
        // First-run color goes to every run
        for run in &runs {
            assert_eq!(run.color().ok().flatten().map(|c| c.to_string()), Some("1F4E79".to_string()));
        }
        assert_eq!(run_languages(p).len(), 2);
    });
    Ok(())
}

#[test]
fn test_apply_translations_withTableCell_shouldWriteIntoCell() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![table_shape(2, &[&["", "Revenue"], &["", ""]])]))?;
    let located = locate_text_units(&deck);

    Reinserter::new(FONT).apply_translations(&mut deck, &located.locations, &["收入".to_string()])?;

    let reopened = reopen(&deck)?;
    let shapes = reopened.slides()[0].shapes();
    let ShapeKind::Table(table) = shapes[0].kind() else {
        panic!("expected a table");
    };
    assert_eq!(table.cell(0, 1).map(|c| c.text()), Some("收入".to_string()));
    assert_eq!(table.cell(0, 0).map(|c| c.text()), Some(String::new()));
    Ok(())
}

#[test]
fn test_apply_translations_withLengthMismatch_shouldFailWithoutWriting() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("One"), paragraph("Two")])]))?;
    let located = locate_text_units(&deck);

    let result = Reinserter::new(FONT).apply_translations(&mut deck, &located.locations, &["一".to_string()]);

    assert!(matches!(
        result,
        Err(ReinsertError::LengthMismatch { locations: 2, translations: 1 })
    ));
    with_first_shape_paragraph(&deck, 0, |p| assert_eq!(p.text(), "One"));
    Ok(())
}

#[test]
fn test_apply_translations_withStaleLocation_shouldReportResolutionError() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("One")])]))?;
    let locations = vec![Location::Paragraph { slide: 3, shape: 0, paragraph: 0 }];

    let result = Reinserter::new(FONT).apply_translations(&mut deck, &locations, &["一".to_string()]);

    assert!(matches!(
        result,
        Err(ReinsertError::Resolution(LocationResolutionError::SlideOutOfRange { slide: 3 }))
    ));
    Ok(())
}

#[test]
fn test_resolve_paragraph_withTableLocationOnTextShape_shouldFail() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("One")])]))?;
    let location = Location::TableCell { slide: 0, shape: 0, row: 0, column: 0, paragraph: 0 };

    let result = resolve_paragraph(&mut deck, &location).map(|_| ());

    assert_eq!(result, Err(LocationResolutionError::NotATable { slide: 0, shape: 0 }));
    Ok(())
}

#[test]
fn test_restore_paragraph_withSnapshotGlyph_shouldInstallBullet() -> Result<()> {
    let styled = open(DeckBuilder::new().slide(vec![text_shape(2, &[styled_paragraph("Bullet")])]))?;
    let mut snapshot = None;
    with_first_shape_paragraph(&styled, 0, |p| snapshot = Some(FormattingSnapshot::capture(p)));
    let snapshot = snapshot.expect("snapshot captured");
    assert!(snapshot.bullet_enabled);

    let mut plain = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("Plain")])]))?;
    let location = Location::Paragraph { slide: 0, shape: 0, paragraph: 0 };
    {
        let mut target = resolve_paragraph(&mut plain, &location)?;
        snapshot.restore_paragraph(&mut target)?;
    }

    with_first_shape_paragraph(&plain, 0, |p| {
        assert!(p.has_bullet());
        assert_eq!(p.alignment(), Some(Alignment::Center));
        assert_eq!(p.text(), "Plain");
    });
    Ok(())
}

#[test]
fn test_restore_paragraph_withBulletButNoGlyph_shouldReportUnavailable() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("Plain")])]))?;
    let snapshot = FormattingSnapshot {
        alignment: Some(Alignment::Right),
        bullet_enabled: true,
        ..FormattingSnapshot::default()
    };
    let location = Location::Paragraph { slide: 0, shape: 0, paragraph: 0 };

    let result = {
        let mut target = resolve_paragraph(&mut deck, &location)?;
        snapshot.restore_paragraph(&mut target)
    };

    assert!(matches!(result, Err(DeckError::BulletUnavailable)));
    // Everything but the bullet is still applied
    with_first_shape_paragraph(&deck, 0, |p| {
        assert_eq!(p.alignment(), Some(Alignment::Right));
        assert!(!p.has_bullet());
    });
    Ok(())
}

#[test]
fn test_apply_translations_withControlCharacters_shouldWriteWellFormedSlide() -> Result<()> {
    let mut deck = open(DeckBuilder::new().slide(vec![text_shape(2, &[paragraph("Hello world")])]))?;
    let located = locate_text_units(&deck);

    Reinserter::new(FONT).apply_translations(
        &mut deck,
        &located.locations,
        &["你\u{0001}好\r\n世界".to_string()],
    )?;

    let bytes = deck.to_bytes()?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut slide_xml = String::new();
    archive.by_name("ppt/slides/slide1.xml")?.read_to_string(&mut slide_xml)?;
    assert!(!slide_xml.contains('\u{0001}'));
    assert!(!slide_xml.contains("好\r"));
    assert!(slide_xml.contains("你_x0001_好</a:t>"));

    let reopened = reopen(&deck)?;
    with_first_shape_paragraph(&reopened, 0, |p| {
        assert_eq!(p.text(), "你_x0001_好\u{000B}世界");
        assert_eq!(p.runs().len(), 2);
    });
    Ok(())
}
