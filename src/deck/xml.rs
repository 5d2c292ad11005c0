/*!
 * Owned XML element tree for presentation parts.
 *
 * Slide parts are small enough to hold in memory, and editing paragraphs in place
 * needs random access to siblings, so parts are parsed into a tree rather than
 * streamed. The tree keeps qualified names, attribute order, text and comments so
 * an unmodified part serializes back to the same markup.
 */

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::DeckError;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with its qualified name, attributes (in source order) and children
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed XML part
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Value of the declaration's `standalone` pseudo-attribute, if any
    standalone: Option<String>,
    /// Whether the source carried an XML declaration at all
    has_declaration: bool,
    pub root: XmlElement,
}

/// Returns the part of a qualified name after the namespace prefix
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attribute value looked up by local name
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| local_name(name) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute by qualified name, keeping its position if it already exists
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute by qualified name
    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(existing, _)| existing != name);
    }

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Child elements with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.local_name() == local)
    }

    /// Mutable child elements with the given local name
    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.elements_mut().filter(move |element| element.local_name() == local)
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.local_name() == local)
    }

    /// First mutable child element with the given local name
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|element| element.local_name() == local)
    }

    /// Follow a path of local names through first matching children
    pub fn descendant(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, local| element.child(local))
    }

    /// Mutable variant of [`XmlElement::descendant`]
    pub fn descendant_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in path {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Concatenated text of this element's direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Remove every child element matching the predicate
    pub fn remove_elements(&mut self, mut predicate: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|node| match node {
            XmlNode::Element(element) => !predicate(element),
            _ => true,
        });
    }

    /// Index (into `children`) of the first child element with the given local name
    pub fn position_of(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|node| {
            matches!(node, XmlNode::Element(element) if element.local_name() == local)
        })
    }

    /// Insert a child element respecting a schema sequence.
    ///
    /// `order` lists local names in the order the schema requires; the child lands
    /// before the first existing sibling that must come after it. Names missing from
    /// `order` sort last.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) -> &mut XmlElement {
        let rank = |local: &str| order.iter().position(|name| *name == local).unwrap_or(order.len());
        let child_rank = rank(child.local_name());
        let index = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(element) if rank(element.local_name()) > child_rank))
            .unwrap_or(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
        match &mut self.children[index] {
            XmlNode::Element(element) => element,
            _ => unreachable!("an element was just inserted at this index"),
        }
    }

    /// Return the first child with the given local name, creating it in schema order if needed
    pub fn ensure_child(&mut self, qualified: &str, order: &[&str]) -> &mut XmlElement {
        let local = local_name(qualified);
        match self.position_of(local) {
            Some(index) => match &mut self.children[index] {
                XmlNode::Element(element) => element,
                _ => unreachable!("position_of only matches elements"),
            },
            None => self.insert_ordered(XmlElement::new(qualified), order),
        }
    }
}

fn xml_error(part: &str, message: impl ToString) -> DeckError {
    DeckError::Xml {
        part: part.to_string(),
        message: message.to_string(),
    }
}

fn element_from_start(part: &str, start: &BytesStart) -> Result<XmlElement, DeckError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| xml_error(part, e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| xml_error(part, e))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

impl XmlDocument {
    /// Wrap a root element
    pub fn new(root: XmlElement) -> Self {
        Self {
            standalone: Some("yes".to_string()),
            has_declaration: true,
            root,
        }
    }

    /// Parse a part. `part` names the part for error messages only.
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self, DeckError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;
        let mut standalone = None;
        let mut has_declaration = false;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| xml_error(part, e))?;
            let node = match event {
                Event::Decl(decl) => {
                    has_declaration = true;
                    standalone = decl
                        .standalone()
                        .and_then(|value| value.ok())
                        .map(|value| String::from_utf8_lossy(&value).into_owned());
                    None
                }
                Event::Start(start) => {
                    stack.push(element_from_start(part, &start)?);
                    None
                }
                Event::Empty(start) => Some(XmlNode::Element(element_from_start(part, &start)?)),
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| xml_error(part, "unexpected closing tag"))?;
                    Some(XmlNode::Element(element))
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| xml_error(part, e))?;
                    Some(XmlNode::Text(text.into_owned()))
                }
                Event::CData(data) => Some(XmlNode::CData(
                    String::from_utf8_lossy(&data.into_inner()).into_owned(),
                )),
                Event::Comment(comment) => Some(XmlNode::Comment(
                    String::from_utf8_lossy(&comment).into_owned(),
                )),
                Event::PI(instruction) => Some(XmlNode::ProcessingInstruction(
                    String::from_utf8_lossy(&instruction).into_owned(),
                )),
                Event::DocType(_) => None,
                Event::Eof => break,
            };

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    // Only the root element matters outside of any parent
                    None => {
                        if let XmlNode::Element(element) = node {
                            root = Some(element);
                        }
                    }
                }
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(xml_error(part, "unclosed element at end of part"));
        }
        let root = root.ok_or_else(|| xml_error(part, "part has no root element"))?;

        Ok(Self {
            standalone,
            has_declaration,
            root,
        })
    }

    /// Serialize the tree back to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, DeckError> {
        let mut writer = Writer::new(Vec::new());
        if self.has_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    "1.0",
                    Some("UTF-8"),
                    self.standalone.as_deref(),
                )))
                .map_err(|e| xml_error("<serialize>", e))?;
            writer
                .write_event(Event::Text(BytesText::from_escaped("\r\n")))
                .map_err(|e| xml_error("<serialize>", e))?;
        }
        write_element(&mut writer, &self.root).map_err(|e| xml_error("<serialize>", e))?;
        Ok(writer.into_inner())
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
            XmlNode::Comment(comment) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
            }
            XmlNode::ProcessingInstruction(instruction) => {
                writer.write_event(Event::PI(BytesText::from_escaped(instruction.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}
