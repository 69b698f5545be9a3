//! Owned, namespace-resolved XML element tree.
//!
//! Invoices are small, so the whole document is read into memory once and the
//! field resolver walks it as many times as it has rules.

mod parser;

pub use parser::parse_document;

use std::collections::HashMap;

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a document from a UTF-8 string.
    pub fn parse(xml: &str) -> Result<Self, crate::error::ExtractionErrorKind> {
        parse_document(xml)
    }

    /// The document element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

/// One element with its resolved namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI the element is bound to, `None` when unqualified.
    pub namespace: Option<String>,
    /// Local name without prefix.
    pub name: String,
    /// Attributes keyed by name as written (prefix kept), values unescaped.
    pub attributes: HashMap<String, String>,
    /// Concatenated direct text and CDATA content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attribute value by name as written.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct text content with surrounding whitespace removed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// True if the element has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// All elements below this one in document order, excluding itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Pre-order iterator over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
