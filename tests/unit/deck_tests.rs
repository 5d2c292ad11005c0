/*!
 * Tests for the presentation container and shape model
 */

use anyhow::Result;
use std::io::Cursor;

use slidetran::deck::{Presentation, ShapeKind};
use slidetran::errors::DeckError;

use crate::common::{paragraph, picture_shape, table_shape, text_shape, DeckBuilder};

#[test]
fn test_from_reader_withThreeSlides_shouldKeepPresentationOrder() -> Result<()> {
    let bytes = DeckBuilder::new()
        .slide(vec![text_shape(2, &[paragraph("First")])])
        .slide(vec![text_shape(2, &[paragraph("Second")])])
        .slide(vec![text_shape(2, &[paragraph("Third")])])
        .build()?;

    let deck = Presentation::from_reader(Cursor::new(bytes))?;

    let names: Vec<&str> = deck.slides().iter().map(|s| s.part_name()).collect();
    assert_eq!(
        names,
        vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml", "ppt/slides/slide3.xml"]
    );
    Ok(())
}

#[test]
fn test_shapes_withMixedShapes_shouldClassifyEach() -> Result<()> {
    let bytes = DeckBuilder::new()
        .slide(vec![
            text_shape(2, &[paragraph("Title")]),
            table_shape(3, &[&["a", "b"]]),
            picture_shape(4),
        ])
        .build()?;
    let deck = Presentation::from_reader(Cursor::new(bytes))?;

    let shapes = deck.slides()[0].shapes();
    assert_eq!(shapes.len(), 3);
    assert!(matches!(shapes[0].kind(), ShapeKind::PlainText(_)));
    assert!(matches!(shapes[1].kind(), ShapeKind::Table(_)));
    assert!(matches!(shapes[2].kind(), ShapeKind::Other));
    assert_eq!(shapes[0].name(), Some("TextBox 2"));
    Ok(())
}

#[test]
fn test_table_cells_withTwoByTwo_shouldExposeTextPerCell() -> Result<()> {
    let bytes = DeckBuilder::new()
        .slide(vec![table_shape(2, &[&["Name", "Value"], &["", "Total"]])])
        .build()?;
    let deck = Presentation::from_reader(Cursor::new(bytes))?;

    let shapes = deck.slides()[0].shapes();
    let ShapeKind::Table(table) = shapes[0].kind() else {
        panic!("expected a table");
    };
    let rows = table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1].text(), "Value");
    assert_eq!(rows[1][0].text(), "");
    assert_eq!(table.cell(1, 1).map(|c| c.text()), Some("Total".to_string()));
    Ok(())
}

#[test]
fn test_to_bytes_withoutChanges_shouldReopenWithSameText() -> Result<()> {
    let bytes = DeckBuilder::new()
        .slide(vec![text_shape(2, &[paragraph("Hello &amp; welcome")])])
        .build()?;
    let deck = Presentation::from_reader(Cursor::new(bytes))?;

    let reopened = Presentation::from_reader(Cursor::new(deck.to_bytes()?))?;

    let shapes = reopened.slides()[0].shapes();
    let ShapeKind::PlainText(frame) = shapes[0].kind() else {
        panic!("expected a text shape");
    };
    assert_eq!(frame.text(), "Hello & welcome");
    Ok(())
}

#[test]
fn test_from_reader_withGarbage_shouldReturnZipError() {
    let result = Presentation::from_reader(Cursor::new(b"not a zip file".to_vec()));
    assert!(matches!(result, Err(DeckError::Zip(_))));
}

#[test]
fn test_open_withMissingFile_shouldReturnIoError() {
    let result = Presentation::open("definitely/not/here.pptx");
    assert!(matches!(result, Err(DeckError::Io(_))));
}
