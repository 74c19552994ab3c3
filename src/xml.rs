//! XML Document Tree Module
//!
//! This module provides the XML document tree that every generated EPUB
//! document is built as, together with the rendering and parsing
//! capabilities consumed by the writer and reader.
//!
//! Rendering produces canonical UTF-8 bytes: an XML declaration, an optional
//! doctype, 4-space indentation, and omission of namespace declarations that
//! are already in scope with the same value. Elements holding only text are
//! rendered on a single line; elements without text and children collapse to
//! a self-closing tag.

use std::io::Cursor;

use indexmap::IndexMap;
use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::EpubError;

/// Represents an element node in an XML document
///
/// The element name is stored as written, including a namespace prefix when
/// present (`dc:title`). Attribute order is preserved, which keeps document
/// generation reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create a new element with the given (possibly prefixed) tag name
    pub fn new(name: &str) -> Self {
        XmlElement {
            name: name.to_string(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Append an attribute, returning the element for chaining
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set the text content, returning the element for chaining
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Append a child element, returning the element for chaining
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    /// Append a child element
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// The tag name of the element, as written
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag name of the element without its namespace prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Returns the value of the specified attribute
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The text content of the element, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The child elements of the element
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Find the first direct child with the specified local name
    pub fn find_child(&self, local_name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|child| child.local_name() == local_name)
    }

    /// Find all elements with the specified local name, in document order
    ///
    /// The search includes the element itself and every descendant.
    pub fn find_elements_by_name<'a>(&'a self, local_name: &str) -> Vec<&'a XmlElement> {
        let mut collection = Vec::new();
        self.collect_elements_by_name(local_name, &mut collection);
        collection
    }

    fn collect_elements_by_name<'a>(
        &'a self,
        local_name: &str,
        collection: &mut Vec<&'a XmlElement>,
    ) {
        if self.local_name() == local_name {
            collection.push(self);
        }
        for child in &self.children {
            child.collect_elements_by_name(local_name, collection);
        }
    }
}

/// The document type declaration of an XML document
#[derive(Debug, Clone, PartialEq)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl Doctype {
    /// A bare declaration with no external subset, e.g. `<!DOCTYPE html>`
    pub fn bare(name: &str) -> Self {
        Doctype {
            name: name.to_string(),
            public_id: None,
            system_id: None,
        }
    }

    /// A declaration with a PUBLIC identifier pair
    pub fn public(name: &str, public_id: &str, system_id: &str) -> Self {
        Doctype {
            name: name.to_string(),
            public_id: Some(public_id.to_string()),
            system_id: Some(system_id.to_string()),
        }
    }

    /// The content between `<!DOCTYPE ` and `>`
    fn content(&self) -> String {
        match (&self.public_id, &self.system_id) {
            (Some(public_id), Some(system_id)) => {
                format!("{} PUBLIC \"{}\" \"{}\"", self.name, public_id, system_id)
            }
            (None, Some(system_id)) => format!("{} SYSTEM \"{}\"", self.name, system_id),
            _ => self.name.clone(),
        }
    }
}

/// An XML document: an optional doctype declaration and a root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub doctype: Option<Doctype>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Create a document without a doctype declaration
    pub fn new(root: XmlElement) -> Self {
        XmlDocument {
            doctype: None,
            root,
        }
    }

    /// Set the doctype declaration, returning the document for chaining
    pub fn with_doctype(mut self, doctype: Doctype) -> Self {
        self.doctype = Some(doctype);
        self
    }

    /// Render the document to canonical UTF-8 bytes
    ///
    /// The output starts with an XML declaration, followed by the doctype
    /// when present, and the element tree indented with 4 spaces per level.
    /// Namespace declarations repeating a binding already in scope are
    /// omitted.
    pub fn render(&self) -> Result<Vec<u8>, EpubError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.content())))?;
        }

        let mut namespace_scope = Vec::new();
        Self::render_element(&mut writer, &self.root, &mut namespace_scope)?;

        Ok(writer.into_inner().into_inner())
    }

    fn render_element(
        writer: &mut Writer<Cursor<Vec<u8>>>,
        element: &XmlElement,
        namespace_scope: &mut Vec<(String, String)>,
    ) -> Result<(), EpubError> {
        let mut start = BytesStart::new(element.name());
        let mut declared = 0;

        for (key, value) in &element.attributes {
            if key == "xmlns" || key.starts_with("xmlns:") {
                let bound = namespace_scope
                    .iter()
                    .rev()
                    .find(|(scope_key, _)| scope_key == key);
                if bound.is_some_and(|(_, scope_value)| scope_value == value) {
                    continue;
                }

                namespace_scope.push((key.clone(), value.clone()));
                declared += 1;
            }

            start.push_attribute((key.as_str(), value.as_str()));
        }

        if element.text.is_none() && element.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;

            if let Some(text) = &element.text {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }

            for child in &element.children {
                Self::render_element(writer, child, namespace_scope)?;
            }

            writer.write_event(Event::End(BytesEnd::new(element.name())))?;
        }

        namespace_scope.truncate(namespace_scope.len() - declared);

        Ok(())
    }
}

/// Parses an XML string and builds the root element
///
/// Comments, processing instructions, declarations, and doctypes are
/// skipped; only the element structure, attributes, and text content
/// survive into the tree.
pub fn parse(content: &str) -> Result<XmlElement, EpubError> {
    if content.is_empty() {
        return Err(EpubError::FailedParsingXml);
    }

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack = Vec::<XmlElement>::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) => {
                let mut element =
                    XmlElement::new(&String::from_utf8_lossy(e.name().as_ref()));
                for attr in e.attributes().flatten() {
                    element.set_attr(
                        &String::from_utf8_lossy(attr.key.as_ref()),
                        &String::from_utf8_lossy(&attr.value),
                    );
                }
                stack.push(element);
            }

            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    } else {
                        root = Some(element);
                    }
                }
            }

            Ok(Event::Empty(e)) => {
                let mut element =
                    XmlElement::new(&String::from_utf8_lossy(e.name().as_ref()));
                for attr in e.attributes().flatten() {
                    element.set_attr(
                        &String::from_utf8_lossy(attr.key.as_ref()),
                        &String::from_utf8_lossy(&attr.value),
                    );
                }

                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                } else {
                    root = Some(element);
                }
            }

            Ok(Event::Text(e)) => {
                if let Some(element) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    if !text.trim().is_empty() {
                        element.text = Some(text);
                    }
                }
            }

            Err(err) => return Err(err.into()),

            // Comment, PI, Declaration, Doctype, CData, GeneralRef
            _ => continue,
        }
    }

    root.ok_or(EpubError::FailedParsingXml)
}

/// Parse an XML document from bytes and build the root element
pub fn parse_bytes(bytes: Vec<u8>) -> Result<XmlElement, EpubError> {
    let content = String::from_utf8(bytes)?;
    parse(&content)
}
