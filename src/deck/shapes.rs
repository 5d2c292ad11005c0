/*!
 * Typed views over DrawingML shapes, tables, paragraphs and runs.
 *
 * Read-only views borrow the slide XML; `ParagraphMut` and `RunMut` edit it in
 * place. Child elements that these views create are inserted in the order the
 * DrawingML schema requires.
 */

use std::fmt;
use std::str::FromStr;

use super::xml::{XmlElement, XmlNode};
use crate::errors::DeckError;

/// Local names of elements that count as shapes inside `p:spTree`
const SHAPE_ELEMENTS: &[&str] = &["sp", "grpSp", "graphicFrame", "cxnSp", "pic", "contentPart"];

/// Child order of `a:p`
const PARAGRAPH_ORDER: &[&str] = &["pPr", "r", "br", "fld", "endParaRPr"];

/// Child order of `a:r`
const RUN_ORDER: &[&str] = &["rPr", "t"];

/// Child order of `a:pPr`
const PARAGRAPH_PROPERTIES_ORDER: &[&str] = &[
    "lnSpc", "spcBef", "spcAft", "buClrTx", "buClr", "buSzTx", "buSzPct", "buSzPts", "buFontTx",
    "buFont", "buNone", "buAutoNum", "buChar", "buBlip", "tabLst", "defRPr", "extLst",
];

/// Child order of `a:rPr`
const RUN_PROPERTIES_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];
const BULLET_GLYPHS: &[&str] = &["buAutoNum", "buChar", "buBlip"];

/// Vertical tab: how a line break inside a paragraph appears in its text
pub const LINE_BREAK: char = '\u{000B}';

/// Characters XML 1.0 cannot carry become `_xHHHH_`, as PowerPoint writes them
fn escape_xml_invalid(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if is_xml_char(c) {
            escaped.push(c);
        } else {
            escaped.push_str(&format!("_x{:04X}_", c as u32));
        }
    }
    escaped
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

pub(crate) fn is_shape_element(element: &XmlElement) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

/// Qualified name with the same prefix as `sibling`
fn qualified(sibling: &str, local: &str) -> String {
    match sibling.split_once(':') {
        Some((prefix, _)) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// Paragraph alignment (`a:pPr@algn`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    JustifyLow,
    Distributed,
    ThaiDistributed,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "l",
            Self::Center => "ctr",
            Self::Right => "r",
            Self::Justify => "just",
            Self::JustifyLow => "justLow",
            Self::Distributed => "dist",
            Self::ThaiDistributed => "thaiDist",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" => Some(Self::Justify),
            "justLow" => Some(Self::JustifyLow),
            "dist" => Some(Self::Distributed),
            "thaiDist" => Some(Self::ThaiDistributed),
            _ => None,
        }
    }
}

/// Font size in hundredths of a point, as stored in `a:rPr@sz`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSize(u32);

impl FontSize {
    pub fn from_hundredths(value: u32) -> Self {
        Self(value)
    }

    pub fn from_points(points: u32) -> Self {
        Self(points * 100)
    }

    pub fn hundredths(&self) -> u32 {
        self.0
    }
}

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor(pub [u8; 3]);

impl FromStr for RgbColor {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DeckError::ColorResolution(format!("invalid RGB value '{}'", s));
        if s.len() != 6 || !s.is_ascii() {
            return Err(invalid());
        }
        let mut rgb = [0u8; 3];
        for (index, channel) in rgb.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&s[index * 2..index * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(rgb))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Paragraph indentation in EMU (`a:pPr@marL`, `a:pPr@indent`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indentation {
    pub margin_left: Option<i64>,
    pub indent: Option<i64>,
}

/// What a shape is, decided once when the shape is visited
#[derive(Debug, Clone, Copy)]
pub enum ShapeKind<'a> {
    PlainText(TextFrame<'a>),
    Table(Table<'a>),
    Other,
}

/// A shape on a slide
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    element: &'a XmlElement,
}

impl<'a> Shape<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    /// The shape's name from its non-visual properties, if any
    pub fn name(&self) -> Option<&'a str> {
        self.element
            .elements()
            .find(|child| child.local_name().starts_with("nv"))
            .and_then(|nv| nv.child("cNvPr"))
            .and_then(|props| props.attr("name"))
    }

    pub fn kind(&self) -> ShapeKind<'a> {
        if let Some(body) = text_body(self.element) {
            return ShapeKind::PlainText(TextFrame::new(body));
        }
        if let Some(table) = table_element(self.element) {
            return ShapeKind::Table(Table::new(table));
        }
        ShapeKind::Other
    }
}

/// `p:txBody` of a plain shape
pub fn text_body(shape: &XmlElement) -> Option<&XmlElement> {
    if shape.local_name() != "sp" {
        return None;
    }
    shape.child("txBody")
}

/// Mutable `p:txBody` of a plain shape
pub fn text_body_mut(shape: &mut XmlElement) -> Option<&mut XmlElement> {
    if shape.local_name() != "sp" {
        return None;
    }
    shape.child_mut("txBody")
}

/// `a:tbl` inside a graphic frame
pub fn table_element(shape: &XmlElement) -> Option<&XmlElement> {
    if shape.local_name() != "graphicFrame" {
        return None;
    }
    shape.descendant(&["graphic", "graphicData", "tbl"])
}

/// Mutable `a:tbl` inside a graphic frame
pub fn table_element_mut(shape: &mut XmlElement) -> Option<&mut XmlElement> {
    if shape.local_name() != "graphicFrame" {
        return None;
    }
    shape.descendant_mut(&["graphic", "graphicData", "tbl"])
}

/// Mutable `a:tc` at (row, column) of an `a:tbl`
pub fn cell_element_mut(table: &mut XmlElement, row: usize, column: usize) -> Option<&mut XmlElement> {
    table
        .children_named_mut("tr")
        .nth(row)?
        .children_named_mut("tc")
        .nth(column)
}

/// Mutable paragraph `index` of a text body
pub fn paragraph_mut(body: &mut XmlElement, index: usize) -> Option<ParagraphMut<'_>> {
    body.children_named_mut("p").nth(index).map(ParagraphMut::new)
}

/// A text body (`p:txBody` or `a:txBody`)
#[derive(Debug, Clone, Copy)]
pub struct TextFrame<'a> {
    body: &'a XmlElement,
}

impl<'a> TextFrame<'a> {
    pub fn new(body: &'a XmlElement) -> Self {
        Self { body }
    }

    pub fn paragraphs(&self) -> Vec<Paragraph<'a>> {
        self.body.children_named("p").map(Paragraph::new).collect()
    }

    /// Paragraph texts joined by newlines
    pub fn text(&self) -> String {
        self.paragraphs()
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table grid
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    element: &'a XmlElement,
}

impl<'a> Table<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    /// Cells grouped by row
    pub fn rows(&self) -> Vec<Vec<Cell<'a>>> {
        self.element
            .children_named("tr")
            .map(|row| row.children_named("tc").map(Cell::new).collect())
            .collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Cell<'a>> {
        self.element
            .children_named("tr")
            .nth(row)?
            .children_named("tc")
            .nth(column)
            .map(Cell::new)
    }
}

/// A table cell
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    element: &'a XmlElement,
}

impl<'a> Cell<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn text_frame(&self) -> Option<TextFrame<'a>> {
        self.element.child("txBody").map(TextFrame::new)
    }

    pub fn paragraphs(&self) -> Vec<Paragraph<'a>> {
        self.text_frame().map(|frame| frame.paragraphs()).unwrap_or_default()
    }

    pub fn text(&self) -> String {
        self.text_frame().map(|frame| frame.text()).unwrap_or_default()
    }
}

/// A paragraph (`a:p`)
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a XmlElement,
}

impl<'a> Paragraph<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    /// Text of runs and fields, with a vertical tab for each line break
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in self.element.elements() {
            match child.local_name() {
                "r" | "fld" => {
                    if let Some(t) = child.child("t") {
                        text.push_str(&t.text());
                    }
                }
                "br" => text.push(LINE_BREAK),
                _ => {}
            }
        }
        text
    }

    pub fn runs(&self) -> Vec<Run<'a>> {
        self.element.children_named("r").map(Run::new).collect()
    }

    fn properties(&self) -> Option<&'a XmlElement> {
        self.element.child("pPr")
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.properties()?.attr("algn").and_then(Alignment::from_attr)
    }

    pub fn level(&self) -> Option<u32> {
        self.properties()?.attr("lvl")?.parse().ok()
    }

    pub fn indentation(&self) -> Indentation {
        let parse = |name: &str| self.properties().and_then(|p| p.attr(name)).and_then(|v| v.parse().ok());
        Indentation {
            margin_left: parse("marL"),
            indent: parse("indent"),
        }
    }

    /// The explicit bullet glyph definition, if the paragraph has one
    pub fn bullet_glyph(&self) -> Option<&'a XmlElement> {
        self.properties()?
            .elements()
            .find(|child| BULLET_GLYPHS.contains(&child.local_name()))
    }

    pub fn has_bullet(&self) -> bool {
        self.bullet_glyph().is_some()
    }
}

/// A text run (`a:r`)
#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a XmlElement,
}

impl<'a> Run<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn text(&self) -> String {
        self.element.child("t").map(|t| t.text()).unwrap_or_default()
    }

    fn properties(&self) -> Option<&'a XmlElement> {
        self.element.child("rPr")
    }

    pub fn font_size(&self) -> Option<FontSize> {
        self.properties()?
            .attr("sz")?
            .parse()
            .ok()
            .map(FontSize::from_hundredths)
    }

    /// Latin typeface of the run
    pub fn font_family(&self) -> Option<&'a str> {
        self.properties()?.child("latin")?.attr("typeface")
    }

    /// East Asian typeface of the run
    pub fn east_asian_font_family(&self) -> Option<&'a str> {
        self.properties()?.child("ea")?.attr("typeface")
    }

    /// The run's solid RGB color.
    ///
    /// `Ok(None)` when the run has no solid fill; an error when the fill uses a
    /// theme, preset or system color that has no RGB value of its own.
    pub fn color(&self) -> Result<Option<RgbColor>, DeckError> {
        let Some(fill) = self.properties().and_then(|p| p.child("solidFill")) else {
            return Ok(None);
        };
        let Some(color) = fill.elements().next() else {
            return Ok(None);
        };
        match color.local_name() {
            "srgbClr" => {
                let value = color
                    .attr("val")
                    .ok_or_else(|| DeckError::ColorResolution("srgbClr without value".to_string()))?;
                value.parse().map(Some)
            }
            other => Err(DeckError::ColorResolution(format!("{} has no RGB value", other))),
        }
    }

    /// The `a:hlinkClick` element of the run, if present
    pub fn hyperlink_click(&self) -> Option<&'a XmlElement> {
        self.properties()?.child("hlinkClick")
    }
}

/// Mutable paragraph view
#[derive(Debug)]
pub struct ParagraphMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> ParagraphMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn as_paragraph(&self) -> Paragraph<'_> {
        Paragraph::new(self.element)
    }

    fn properties_mut(&mut self) -> &mut XmlElement {
        let name = qualified(&self.element.name, "pPr");
        self.element.ensure_child(&name, PARAGRAPH_ORDER)
    }

    /// Replace the paragraph's content with `text`.
    ///
    /// All runs, breaks and fields are dropped; paragraph properties and the
    /// end-of-paragraph run properties stay. Each line of `text` becomes one run
    /// without properties, lines are separated by `a:br`.
    pub fn replace_text(&mut self, text: &str) {
        self.element
            .remove_elements(|child| matches!(child.local_name(), "r" | "br" | "fld"));

        let run_name = qualified(&self.element.name, "r");
        let text_name = qualified(&self.element.name, "t");
        let break_name = qualified(&self.element.name, "br");
        let mut position = self
            .element
            .position_of("endParaRPr")
            .unwrap_or(self.element.children.len());

        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        for (index, line) in text.split([LINE_BREAK, '\n']).enumerate() {
            if index > 0 {
                let line_break = XmlElement::new(break_name.as_str());
                self.element.children.insert(position, XmlNode::Element(line_break));
                position += 1;
            }
            if line.is_empty() {
                continue;
            }
            let run = XmlElement::new(run_name.as_str())
                .with_child(XmlElement::new(text_name.as_str()).with_text(escape_xml_invalid(line)));
            self.element.children.insert(position, XmlNode::Element(run));
            position += 1;
        }
    }

    pub fn runs_mut(&mut self) -> Vec<RunMut<'_>> {
        self.element.children_named_mut("r").map(RunMut::new).collect()
    }

    pub fn set_alignment(&mut self, alignment: Option<Alignment>) {
        match alignment {
            Some(alignment) => self.properties_mut().set_attr("algn", alignment.as_str()),
            None => {
                if let Some(properties) = self.element.child_mut("pPr") {
                    properties.remove_attr("algn");
                }
            }
        }
    }

    pub fn set_level(&mut self, level: Option<u32>) {
        match level {
            Some(level) => self.properties_mut().set_attr("lvl", level.to_string()),
            None => {
                if let Some(properties) = self.element.child_mut("pPr") {
                    properties.remove_attr("lvl");
                }
            }
        }
    }

    pub fn set_indentation(&mut self, indentation: Indentation) {
        for (name, value) in [("marL", indentation.margin_left), ("indent", indentation.indent)] {
            match value {
                Some(value) => self.properties_mut().set_attr(name, value.to_string()),
                None => {
                    if let Some(properties) = self.element.child_mut("pPr") {
                        properties.remove_attr(name);
                    }
                }
            }
        }
    }

    /// Switch the bullet on.
    ///
    /// A paragraph that already has a glyph is left alone. Otherwise `glyph` is
    /// installed (replacing any `a:buNone`); without a glyph there is nothing to
    /// switch on and `DeckError::BulletUnavailable` is returned.
    pub fn enable_bullet(&mut self, glyph: Option<&XmlElement>) -> Result<(), DeckError> {
        if self.as_paragraph().has_bullet() {
            return Ok(());
        }
        let glyph = glyph.ok_or(DeckError::BulletUnavailable)?;
        let properties = self.properties_mut();
        properties.remove_elements(|child| child.local_name() == "buNone");
        properties.insert_ordered(glyph.clone(), PARAGRAPH_PROPERTIES_ORDER);
        Ok(())
    }
}

/// Mutable run view
#[derive(Debug)]
pub struct RunMut<'a> {
    element: &'a mut XmlElement,
}

impl<'a> RunMut<'a> {
    pub fn new(element: &'a mut XmlElement) -> Self {
        Self { element }
    }

    pub fn as_run(&self) -> Run<'_> {
        Run::new(self.element)
    }

    fn properties_mut(&mut self) -> &mut XmlElement {
        let name = qualified(&self.element.name, "rPr");
        self.element.ensure_child(&name, RUN_ORDER)
    }

    /// Set both the Latin and the East Asian typeface
    pub fn set_font_family(&mut self, typeface: &str) {
        let properties = self.properties_mut();
        for local in ["latin", "ea"] {
            let name = qualified(&properties.name, local);
            properties
                .ensure_child(&name, RUN_PROPERTIES_ORDER)
                .set_attr("typeface", typeface);
        }
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.properties_mut().set_attr("sz", size.hundredths().to_string());
    }

    pub fn set_color(&mut self, color: RgbColor) {
        let properties = self.properties_mut();
        properties.remove_elements(|child| FILL_ELEMENTS.contains(&child.local_name()));
        let fill = XmlElement::new(qualified(&properties.name, "solidFill"))
            .with_child(XmlElement::new(qualified(&properties.name, "srgbClr")).with_attr("val", color.to_string()));
        properties.insert_ordered(fill, RUN_PROPERTIES_ORDER);
    }

    /// Language tag of the run text (`a:rPr@lang`)
    pub fn set_language(&mut self, tag: &str) {
        self.properties_mut().set_attr("lang", tag);
    }
}
