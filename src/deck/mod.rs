/*!
 * Presentation container.
 *
 * A `.pptx` file is a ZIP package of XML parts. This module loads the package,
 * parses slide parts (and their relationship parts) into XML trees, and writes
 * the package back with every other part copied byte-for-byte.
 *
 * - `xml`: owned XML tree used for slide parts
 * - `shapes`: typed views over shapes, tables, paragraphs and runs
 */

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DeckError;

pub mod shapes;
pub mod xml;

pub use self::shapes::{
    Alignment, Cell, FontSize, Indentation, Paragraph, ParagraphMut, RgbColor, Run, RunMut, Shape,
    ShapeKind, Table, TextFrame,
};
pub use self::xml::{XmlDocument, XmlElement, XmlNode};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// A relationship from a part to another part or an external address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub target: String,
    pub external: bool,
}

/// Relationships of one part, keyed by relationship id
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    items: HashMap<String, Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self, DeckError> {
        let doc = XmlDocument::parse(part, bytes)?;
        let items = doc
            .root
            .children_named("Relationship")
            .filter_map(|rel| {
                let id = rel.attr("Id")?.to_string();
                let target = rel.attr("Target").unwrap_or_default().to_string();
                let external = rel.attr("TargetMode") == Some("External");
                Some((id.clone(), Relationship { id, target, external }))
            })
            .collect();
        Ok(Self { items })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One slide: its parsed XML and its relationships
#[derive(Debug, Clone)]
pub struct Slide {
    part_name: String,
    xml: XmlDocument,
    relationships: Relationships,
}

impl Slide {
    /// Build a slide from an already-parsed part
    pub fn new(part_name: impl Into<String>, xml: XmlDocument, relationships: Relationships) -> Self {
        Self {
            part_name: part_name.into(),
            xml,
            relationships,
        }
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    fn shape_tree(&self) -> Option<&XmlElement> {
        self.xml.root.descendant(&["cSld", "spTree"])
    }

    fn shape_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root.descendant_mut(&["cSld", "spTree"])
    }

    /// Shapes of the slide in z-order
    pub fn shapes(&self) -> Vec<Shape<'_>> {
        self.shape_tree()
            .map(|tree| tree.elements().filter(|e| shapes::is_shape_element(e)).map(Shape::new).collect())
            .unwrap_or_default()
    }

    /// Mutable access to the shape element at `index`
    pub fn shape_element_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.shape_tree_mut()?
            .elements_mut()
            .filter(|e| shapes::is_shape_element(e))
            .nth(index)
    }
}

/// A package entry kept verbatim
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
}

/// An open presentation
#[derive(Debug, Clone)]
pub struct Presentation {
    entries: Vec<PackageEntry>,
    slides: Vec<Slide>,
}

impl Presentation {
    /// Open a presentation from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Load a presentation from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, DeckError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
            });
        }

        let slide_parts = slide_part_names(&entries)?;
        let mut slides = Vec::with_capacity(slide_parts.len());
        for part_name in slide_parts {
            let data = find_entry(&entries, &part_name)
                .ok_or_else(|| DeckError::MissingPart(part_name.clone()))?;
            let xml = XmlDocument::parse(&part_name, data)?;
            let rels_name = rels_part_name(&part_name);
            let relationships = match find_entry(&entries, &rels_name) {
                Some(rels) => Relationships::parse(&rels_name, rels)?,
                None => Relationships::default(),
            };
            slides.push(Slide::new(part_name, xml, relationships));
        }

        debug!("Loaded presentation with {} parts and {} slides", entries.len(), slides.len());
        Ok(Self { entries, slides })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Serialize the package, replacing slide parts with their current XML
    pub fn to_bytes(&self) -> Result<Vec<u8>, DeckError> {
        let mut rendered: HashMap<&str, Vec<u8>> = HashMap::new();
        for slide in &self.slides {
            rendered.insert(slide.part_name.as_str(), slide.xml.to_bytes()?);
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            let data = rendered
                .get(entry.name.as_str())
                .map(Vec::as_slice)
                .unwrap_or(entry.data.as_slice());
            writer.write_all(data)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

fn find_entry<'a>(entries: &'a [PackageEntry], name: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.data.as_slice())
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
fn rels_part_name(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolve a relationship target against the directory of the source part
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Slide part names in presentation order
fn slide_part_names(entries: &[PackageEntry]) -> Result<Vec<String>, DeckError> {
    let presentation = find_entry(entries, PRESENTATION_PART)
        .ok_or_else(|| DeckError::MissingPart(PRESENTATION_PART.to_string()))?;
    let presentation = XmlDocument::parse(PRESENTATION_PART, presentation)?;
    let relationships = match find_entry(entries, PRESENTATION_RELS_PART) {
        Some(rels) => Relationships::parse(PRESENTATION_RELS_PART, rels)?,
        None => Relationships::default(),
    };

    let ordered: Vec<String> = presentation
        .root
        .descendant(&["sldIdLst"])
        .map(|list| {
            list.children_named("sldId")
                .filter_map(relationship_id)
                .filter_map(|rel_id| relationships.get(&rel_id))
                .map(|rel| resolve_target("ppt", &rel.target))
                .collect()
        })
        .unwrap_or_default();

    if !ordered.is_empty() {
        return Ok(ordered);
    }

    // No slide list: fall back to numeric order of slide part names
    let pattern = Regex::new(r"^ppt/slides/slide(\d+)\.xml$").map_err(|e| DeckError::Xml {
        part: PRESENTATION_PART.to_string(),
        message: e.to_string(),
    })?;
    let mut numbered: Vec<(u32, String)> = entries
        .iter()
        .filter_map(|entry| {
            let number = pattern.captures(&entry.name)?.get(1)?.as_str().parse().ok()?;
            Some((number, entry.name.clone()))
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

/// The `r:id` attribute of a `p:sldId` element (its plain `id` is a numeric slide id)
pub fn relationship_id(element: &XmlElement) -> Option<String> {
    element
        .attributes
        .iter()
        .find(|(name, _)| name.contains(':') && xml::local_name(name) == "id")
        .map(|(_, value)| value.clone())
}
