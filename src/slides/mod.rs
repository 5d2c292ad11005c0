/*!
 * Text extraction and reinsertion for slide decks.
 *
 * - `hyperlink`: decides whether a paragraph carries a navigable link
 * - `locator`: walks a presentation and emits translatable text units
 * - `formatting`: paragraph style snapshots taken around text replacement
 * - `reinsert`: writes translations back to the locations they came from
 *
 * Locations are positional. They are only valid against the presentation they
 * were produced from, and only while no shape, cell or paragraph is added or
 * removed in between.
 */

use std::fmt;

pub mod formatting;
pub mod hyperlink;
pub mod locator;
pub mod reinsert;

pub use formatting::FormattingSnapshot;
pub use hyperlink::has_hyperlink;
pub use locator::locate_text_units;
pub use reinsert::{ReinsertReport, Reinserter};

/// Positional address of one translatable paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// A paragraph in a shape's text frame
    Paragraph {
        slide: usize,
        shape: usize,
        paragraph: usize,
    },
    /// A paragraph inside a table cell
    TableCell {
        slide: usize,
        shape: usize,
        row: usize,
        column: usize,
        paragraph: usize,
    },
}

impl Location {
    pub fn slide(&self) -> usize {
        match self {
            Self::Paragraph { slide, .. } | Self::TableCell { slide, .. } => *slide,
        }
    }

    pub fn shape(&self) -> usize {
        match self {
            Self::Paragraph { shape, .. } | Self::TableCell { shape, .. } => *shape,
        }
    }

    pub fn paragraph(&self) -> usize {
        match self {
            Self::Paragraph { paragraph, .. } | Self::TableCell { paragraph, .. } => *paragraph,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paragraph {
                slide,
                shape,
                paragraph,
            } => write!(f, "slide {} shape {} paragraph {}", slide, shape, paragraph),
            Self::TableCell {
                slide,
                shape,
                row,
                column,
                paragraph,
            } => write!(
                f,
                "slide {} shape {} cell ({}, {}) paragraph {}",
                slide, shape, row, column, paragraph
            ),
        }
    }
}

/// One translatable unit: trimmed, non-empty text and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub content: String,
    pub location: Location,
}

/// Locator output as two parallel sequences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedText {
    pub contents: Vec<String>,
    pub locations: Vec<Location>,
}

impl LocatedText {
    pub fn push(&mut self, unit: TextUnit) {
        self.contents.push(unit.content);
        self.locations.push(unit.location);
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
