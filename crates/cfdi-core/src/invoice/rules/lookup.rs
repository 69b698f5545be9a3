//! A single candidate location for a field value.

use std::fmt;

use crate::xml::XmlElement;

/// Where the value is read from once the element is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Named attribute, matched by the name as written.
    Attribute(&'static str),
    /// The element's own text content.
    Text,
}

/// Element path, prefix mapping and value source.
///
/// Paths use the `.//prefix:Tag/prefix:Child` shape: the first step is found
/// anywhere below the document element, later steps are direct children. An
/// unprefixed step only matches elements in no namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRule {
    pub path: &'static str,
    pub namespaces: &'static [(&'static str, &'static str)],
    pub source: ValueSource,
}

impl LookupRule {
    pub const fn attribute(
        path: &'static str,
        namespaces: &'static [(&'static str, &'static str)],
        name: &'static str,
    ) -> Self {
        Self {
            path,
            namespaces,
            source: ValueSource::Attribute(name),
        }
    }

    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            namespaces: &[],
            source: ValueSource::Text,
        }
    }

    /// Non-empty value at the first element matching the path.
    ///
    /// Only that first element is read: when it lacks the value the rule
    /// does not match, even if a later element would have it.
    pub fn lookup<'a>(&self, root: &'a XmlElement) -> Option<&'a str> {
        let element = self.find(root)?;
        let value = match self.source {
            ValueSource::Attribute(name) => element.attribute(name)?,
            ValueSource::Text => element.text(),
        };
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    /// First element (document order) matching the path.
    pub fn find<'a>(&self, root: &'a XmlElement) -> Option<&'a XmlElement> {
        let steps = self.steps();
        let (first, rest) = steps.split_first()?;

        root.descendants()
            .filter(|element| self.step_matches(element, first))
            .find_map(|element| self.find_below(element, rest))
    }

    fn find_below<'a>(&self, element: &'a XmlElement, steps: &[&str]) -> Option<&'a XmlElement> {
        let Some((step, rest)) = steps.split_first() else {
            return Some(element);
        };
        element
            .children
            .iter()
            .filter(|child| self.step_matches(child, step))
            .find_map(|child| self.find_below(child, rest))
    }

    fn steps(&self) -> Vec<&'static str> {
        self.path
            .trim_start_matches(".//")
            .split('/')
            .filter(|step| !step.is_empty() && *step != ".")
            .collect()
    }

    fn step_matches(&self, element: &XmlElement, step: &str) -> bool {
        match step.split_once(':') {
            Some((prefix, local)) => self
                .namespace(prefix)
                .is_some_and(|uri| element.is(Some(uri), local)),
            None => element.is(None, step),
        }
    }

    fn namespace(&self, prefix: &str) -> Option<&'static str> {
        self.namespaces
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }
}

impl fmt::Display for LookupRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            ValueSource::Attribute(name) => write!(f, "{}@{}", self.path, name),
            ValueSource::Text => write!(f, "{}#text", self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pretty_assertions::assert_eq;

    const NS: &[(&str, &str)] = &[("c", "urn:c")];

    #[test]
    fn test_find_nested_path() {
        let doc = XmlDocument::parse(
            r#"<c:Root xmlns:c="urn:c">
                <c:Conceptos><c:Concepto><c:Impuestos><c:Traslados><c:Traslado Importe="1.00"/></c:Traslados></c:Impuestos></c:Concepto></c:Conceptos>
                <c:Impuestos><c:Traslados><c:Traslado Importe="16.00"/></c:Traslados></c:Impuestos>
            </c:Root>"#,
        )
        .unwrap();

        let rule = LookupRule::attribute(".//c:Impuestos/c:Traslados/c:Traslado", NS, "Importe");
        // Document order: the line-level tax comes first.
        assert_eq!(rule.lookup(doc.root()), Some("1.00"));
    }

    #[test]
    fn test_first_match_only() {
        let doc = XmlDocument::parse(r#"<r><e/><e a="x"/></r>"#).unwrap();
        let rule = LookupRule::attribute(".//e", &[], "a");
        assert_eq!(rule.lookup(doc.root()), None);
    }

    #[test]
    fn test_unmapped_prefix_never_matches() {
        let doc = XmlDocument::parse(r#"<r xmlns:c="urn:c"><c:e a="x"/></r>"#).unwrap();
        let rule = LookupRule::attribute(".//c:e", &[], "a");
        assert_eq!(rule.lookup(doc.root()), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(LookupRule::attribute(".//e", &[], "a").to_string(), ".//e@a");
        assert_eq!(LookupRule::text(".//e").to_string(), ".//e#text");
    }
}
