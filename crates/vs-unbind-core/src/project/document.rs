//! Owned XML tree for project files.
//!
//! Attribute values, text, comments and CDATA are kept exactly as they were
//! escaped in the source so untouched content is written back verbatim.
//! Whitespace-only text is dropped on load; the writer re-indents.

use crate::error::Error;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    /// Raw, still-escaped value.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocument {
    pub declaration: Option<XmlDeclaration>,
    /// Comments, PIs and doctype before the root element.
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    /// Comments and PIs after the root element.
    pub epilog: Vec<XmlNode>,
}

/// Part of a qualified name after the namespace prefix.
pub fn local_name(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn utf8_string(bytes: &[u8]) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| Error::MalformedProject(format!("invalid UTF-8 in markup: {}", err)))
}

fn cow_to_string(bytes: Cow<'_, [u8]>) -> Result<String, Error> {
    utf8_string(&bytes)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    fn from_start(start: &BytesStart<'_>, self_closing: bool) -> Result<Self, Error> {
        let mut element = XmlElement::new(utf8_string(start.name().as_ref())?);
        element.self_closing = self_closing;
        for attribute in start.attributes() {
            let attribute = attribute?;
            element.attributes.push(XmlAttribute {
                name: utf8_string(attribute.key.as_ref())?,
                // Single-quoted values may hold a bare `"`; the writer always uses `"`.
                value: cow_to_string(attribute.value)?.replace('"', "&quot;"),
            });
        }
        Ok(element)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Depth-first visit of this element and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    /// Removes every descendant element and every attribute (on this element
    /// and below) whose local name starts with `prefix`. Returns how many
    /// elements and attributes were removed; subtrees count once.
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.attributes.len() + self.children.len();
        self.attributes
            .retain(|attribute| !local_name(&attribute.name).starts_with(prefix));
        self.children.retain(|child| match child {
            XmlNode::Element(element) => !element.local_name().starts_with(prefix),
            _ => true,
        });
        let mut removed = before - (self.attributes.len() + self.children.len());

        for child in self.children.iter_mut() {
            if let XmlNode::Element(element) = child {
                removed += element.remove_prefixed(prefix);
            }
        }
        removed
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), Error> {
        let mut start = BytesStart::new(self.name.as_str());
        for attribute in &self.attributes {
            start.push_attribute(Attribute {
                key: QName(attribute.name.as_bytes()),
                value: Cow::Borrowed(attribute.value.as_bytes()),
            });
        }

        if self.children.is_empty() && self.self_closing {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl XmlNode {
    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), Error> {
        match self {
            XmlNode::Element(element) => return element.write(writer),
            XmlNode::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?
            }
            XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
            XmlNode::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
            XmlNode::ProcessingInstruction(text) => {
                writer.write_event(Event::PI(BytesPI::new(text.as_str())))?
            }
            XmlNode::DocType(text) => {
                writer.write_event(Event::DocType(BytesText::from_escaped(text.as_str())))?
            }
        }
        Ok(())
    }
}

impl ProjectDocument {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(text);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;
        // Open elements, innermost last.
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Eof => break,
                Event::Decl(decl) => {
                    declaration = Some(read_declaration(&decl)?);
                    continue;
                }
                Event::Start(start) => {
                    stack.push(XmlElement::from_start(&start, false)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::MalformedProject("unexpected closing tag".to_string())
                    })?;
                    XmlNode::Element(element)
                }
                Event::Empty(start) => XmlNode::Element(XmlElement::from_start(&start, true)?),
                Event::Text(text) => {
                    if is_blank(&text) {
                        continue;
                    }
                    XmlNode::Text(utf8_string(&text)?)
                }
                Event::CData(text) => XmlNode::CData(utf8_string(&text)?),
                Event::Comment(text) => XmlNode::Comment(utf8_string(&text)?),
                Event::PI(pi) => XmlNode::ProcessingInstruction(utf8_string(&pi)?),
                Event::DocType(text) => XmlNode::DocType(utf8_string(&text)?),
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }

            match node {
                XmlNode::Element(element) if root.is_none() => root = Some(element),
                XmlNode::Element(element) => {
                    return Err(Error::MalformedProject(format!(
                        "second root element <{}>",
                        element.name
                    )))
                }
                XmlNode::Text(_) | XmlNode::CData(_) => {
                    return Err(Error::MalformedProject(
                        "text outside the root element".to_string(),
                    ))
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::MalformedProject(format!(
                "element <{}> is never closed",
                open.name
            )));
        }

        let root =
            root.ok_or_else(|| Error::MalformedProject("no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
            epilog,
        })
    }

    pub fn declared_encoding(&self) -> Option<&str> {
        self.declaration
            .as_ref()
            .and_then(|declaration| declaration.encoding.as_deref())
            .filter(|encoding| !encoding.is_empty())
    }

    /// Removes all elements and attributes whose local name starts with
    /// `prefix`, anywhere in the tree. The root element itself is kept.
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        self.root.remove_prefixed(prefix)
    }

    /// True if any element or attribute local name starts with `prefix`.
    pub fn contains_prefixed(&self, prefix: &str) -> bool {
        let mut found = false;
        self.root.walk(&mut |element| {
            found |= element.local_name().starts_with(prefix)
                || element
                    .attributes
                    .iter()
                    .any(|attribute| local_name(&attribute.name).starts_with(prefix));
        });
        found
    }

    /// Serializes with `indent` spaces per level and `\n` line breaks.
    /// `encoding` replaces the declaration's encoding attribute.
    pub fn to_xml(&self, indent: usize, encoding: Option<&str>) -> Result<String, Error> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);

        if let Some(declaration) = &self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                encoding,
                declaration.standalone.as_deref(),
            )))?;
        }
        for node in &self.prolog {
            node.write(&mut writer)?;
        }
        self.root.write(&mut writer)?;
        for node in &self.epilog {
            node.write(&mut writer)?;
        }

        utf8_string(&writer.into_inner())
    }
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<XmlDeclaration, Error> {
    let version = cow_to_string(decl.version()?)?;
    let encoding = decl.encoding().transpose()?.map(cow_to_string).transpose()?;
    let standalone = decl
        .standalone()
        .transpose()?
        .map(cow_to_string)
        .transpose()?;
    Ok(XmlDeclaration {
        version,
        encoding,
        standalone,
    })
}
