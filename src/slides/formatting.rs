/*!
 * Paragraph formatting snapshot.
 *
 * Replacing a paragraph's text drops its runs and their properties. The snapshot
 * records what the paragraph looked like before, so the new runs can be styled
 * the same way afterwards.
 */

use log::trace;

use crate::deck::shapes::Indentation;
use crate::deck::{Alignment, FontSize, Paragraph, ParagraphMut, RgbColor, XmlElement};
use crate::errors::DeckError;

/// Style state of one paragraph, captured right before its text is replaced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattingSnapshot {
    pub alignment: Option<Alignment>,
    pub level: Option<u32>,
    pub indentation: Indentation,
    pub bullet_enabled: bool,
    /// Glyph definition to reinstall if the bullet went missing
    pub bullet_glyph: Option<XmlElement>,
    /// Color of the first run, broadcast to every new run
    pub color: Option<RgbColor>,
    /// Font size per original run; `None` means inherited
    pub font_sizes: Vec<Option<FontSize>>,
}

impl FormattingSnapshot {
    pub fn capture(paragraph: &Paragraph<'_>) -> Self {
        let runs = paragraph.runs();
        let color = match runs.first().map(|run| run.color()) {
            Some(Ok(color)) => color,
            Some(Err(e)) => {
                trace!("Ignoring first run color: {}", e);
                None
            }
            None => None,
        };
        let bullet_glyph = paragraph.bullet_glyph().cloned();

        Self {
            alignment: paragraph.alignment(),
            level: paragraph.level(),
            indentation: paragraph.indentation(),
            bullet_enabled: bullet_glyph.is_some(),
            bullet_glyph,
            color,
            font_sizes: runs.iter().map(|run| run.font_size()).collect(),
        }
    }

    /// Style the paragraph's current runs: target font on all, size by run index,
    /// first-run color on all
    pub fn restore_runs(&self, paragraph: &mut ParagraphMut<'_>, target_font: &str) {
        for (index, mut run) in paragraph.runs_mut().into_iter().enumerate() {
            run.set_font_family(target_font);
            if let Some(Some(size)) = self.font_sizes.get(index) {
                run.set_font_size(*size);
            }
            if let Some(color) = self.color {
                run.set_color(color);
            }
        }
    }

    /// Reapply alignment, level, indentation and bullet state.
    ///
    /// Everything except the bullet is always applied; a bullet that cannot be
    /// switched back on is returned as an error for the caller to log.
    pub fn restore_paragraph(&self, paragraph: &mut ParagraphMut<'_>) -> Result<(), DeckError> {
        paragraph.set_alignment(self.alignment);
        paragraph.set_level(self.level);
        paragraph.set_indentation(self.indentation);
        if self.bullet_enabled {
            paragraph.enable_bullet(self.bullet_glyph.as_ref())?;
        }
        Ok(())
    }
}
