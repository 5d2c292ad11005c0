/*!
 * Reinsertion engine.
 *
 * Writes translation `i` into location `i`, replacing the paragraph's text and
 * restyling it from a snapshot taken just before. Shapes, cells and paragraphs
 * are never added or removed.
 */

use log::{debug, warn};

use super::formatting::FormattingSnapshot;
use super::Location;
use crate::deck::shapes::{cell_element_mut, paragraph_mut, table_element_mut, text_body_mut};
use crate::deck::{ParagraphMut, Presentation};
use crate::errors::{LocationResolutionError, ReinsertError};

/// Language tag written on every run created by reinsertion
pub const TARGET_LANGUAGE_TAG: &str = "zh-CN";

/// Outcome of one reinsertion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReinsertReport {
    pub paragraphs_written: usize,
    /// Locations whose bullet could not be restored
    pub bullet_failures: Vec<Location>,
}

/// Writes translations back into a presentation
#[derive(Debug, Clone)]
pub struct Reinserter {
    target_font: String,
}

impl Reinserter {
    pub fn new(target_font: impl Into<String>) -> Self {
        Self {
            target_font: target_font.into(),
        }
    }

    pub fn target_font(&self) -> &str {
        &self.target_font
    }

    /// Apply `translations[i]` at `locations[i]` for every `i`
    pub fn apply_translations(
        &self,
        presentation: &mut Presentation,
        locations: &[Location],
        translations: &[String],
    ) -> Result<ReinsertReport, ReinsertError> {
        if locations.len() != translations.len() {
            return Err(ReinsertError::LengthMismatch {
                locations: locations.len(),
                translations: translations.len(),
            });
        }

        let mut report = ReinsertReport::default();
        for (location, text) in locations.iter().zip(translations) {
            let mut paragraph = resolve_paragraph(presentation, location)?;

            let snapshot = FormattingSnapshot::capture(&paragraph.as_paragraph());
            paragraph.replace_text(text);
            for mut run in paragraph.runs_mut() {
                run.set_language(TARGET_LANGUAGE_TAG);
            }
            snapshot.restore_runs(&mut paragraph, &self.target_font);

            if let Err(e) = snapshot.restore_paragraph(&mut paragraph) {
                warn!("Could not restore bullet at {}: {}", location, e);
                report.bullet_failures.push(*location);
            }
            report.paragraphs_written += 1;
        }

        debug!(
            "Reinserted {} paragraphs ({} bullet failures)",
            report.paragraphs_written,
            report.bullet_failures.len()
        );
        Ok(report)
    }
}

/// Find the paragraph a location points to in the current presentation state
pub fn resolve_paragraph<'a>(
    presentation: &'a mut Presentation,
    location: &Location,
) -> Result<ParagraphMut<'a>, LocationResolutionError> {
    let slide_index = location.slide();
    let shape_index = location.shape();
    let slide = presentation
        .slide_mut(slide_index)
        .ok_or(LocationResolutionError::SlideOutOfRange { slide: slide_index })?;
    let shape = slide
        .shape_element_mut(shape_index)
        .ok_or(LocationResolutionError::ShapeOutOfRange {
            slide: slide_index,
            shape: shape_index,
        })?;

    let body = match *location {
        Location::Paragraph { .. } => {
            text_body_mut(shape).ok_or(LocationResolutionError::NotATextShape {
                slide: slide_index,
                shape: shape_index,
            })?
        }
        Location::TableCell { row, column, .. } => {
            let table = table_element_mut(shape).ok_or(LocationResolutionError::NotATable {
                slide: slide_index,
                shape: shape_index,
            })?;
            let out_of_range = LocationResolutionError::CellOutOfRange {
                slide: slide_index,
                shape: shape_index,
                row,
                column,
            };
            let cell = cell_element_mut(table, row, column).ok_or(out_of_range.clone())?;
            cell.child_mut("txBody").ok_or(out_of_range)?
        }
    };

    let paragraph = location.paragraph();
    paragraph_mut(body, paragraph).ok_or_else(|| LocationResolutionError::ParagraphOutOfRange {
        container: location.to_string(),
        paragraph,
    })
}
