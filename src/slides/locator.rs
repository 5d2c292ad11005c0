/*!
 * Text locator.
 *
 * Walks slides in order, shapes in z-order within a slide, and emits one unit per
 * paragraph with visible text: text-frame paragraphs in order for plain shapes,
 * (row, column, paragraph) order for tables. The emission order is the only link
 * between a unit and the translation written back later.
 */

use log::{debug, trace};

use super::hyperlink::{has_hyperlink, log_skipped};
use super::{LocatedText, Location, TextUnit};
use crate::deck::{Paragraph, Presentation, Relationships, ShapeKind};

/// Collect every translatable paragraph of the presentation
pub fn locate_text_units(presentation: &Presentation) -> LocatedText {
    let mut located = LocatedText::default();

    for (slide_index, slide) in presentation.slides().iter().enumerate() {
        let relationships = slide.relationships();
        for (shape_index, shape) in slide.shapes().iter().enumerate() {
            match shape.kind() {
                ShapeKind::PlainText(frame) => {
                    if frame.text().trim().is_empty() {
                        continue;
                    }
                    for (paragraph_index, paragraph) in frame.paragraphs().iter().enumerate() {
                        let location = Location::Paragraph {
                            slide: slide_index,
                            shape: shape_index,
                            paragraph: paragraph_index,
                        };
                        if let Some(unit) = eligible_unit(paragraph, relationships, location) {
                            located.push(unit);
                        }
                    }
                }
                ShapeKind::Table(table) => {
                    for (row_index, row) in table.rows().iter().enumerate() {
                        for (column_index, cell) in row.iter().enumerate() {
                            if cell.text().trim().is_empty() {
                                continue;
                            }
                            for (paragraph_index, paragraph) in cell.paragraphs().iter().enumerate() {
                                let location = Location::TableCell {
                                    slide: slide_index,
                                    shape: shape_index,
                                    row: row_index,
                                    column: column_index,
                                    paragraph: paragraph_index,
                                };
                                if let Some(unit) = eligible_unit(paragraph, relationships, location) {
                                    located.push(unit);
                                }
                            }
                        }
                    }
                }
                ShapeKind::Other => {
                    trace!("Slide {} shape {} has no text", slide_index, shape_index);
                }
            }
        }
    }

    debug!("Located {} text units", located.len());
    located
}

fn eligible_unit(
    paragraph: &Paragraph<'_>,
    relationships: &Relationships,
    location: Location,
) -> Option<TextUnit> {
    let text = paragraph.text();
    let content = text.trim();
    if content.is_empty() {
        return None;
    }
    if has_hyperlink(paragraph, relationships) {
        log_skipped(content);
        return None;
    }
    Some(TextUnit {
        content: content.to_string(),
        location,
    })
}
