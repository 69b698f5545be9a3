//! Rule-based field resolution over XML invoice documents.
//!
//! Each field has a static, ordered list of candidate locations. One generic
//! routine walks the list and returns the first usable value, so the priority
//! order lives in data ([`catalog`]) rather than in branching code.

pub mod amounts;
pub mod catalog;
mod lookup;

pub use amounts::{parse_amount, AmountValue};
pub use catalog::*;
pub use lookup::{LookupRule, ValueSource};

use crate::models::invoice::UNKNOWN;
use crate::xml::XmlElement;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from a document root.
    fn extract(&self, root: &XmlElement) -> Option<Self::Output>;
}

/// A resolved value together with the candidate that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Index of the winning candidate in its list.
    pub rank: usize,
    /// Human-readable description of the winning candidate.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rank: usize, source: impl Into<String>) -> Self {
        Self {
            value,
            rank,
            source: source.into(),
        }
    }
}

/// Ordered list of descendant lookups; first non-empty value wins.
#[derive(Debug, Clone, Copy)]
pub struct RuleChain(pub &'static [LookupRule]);

impl FieldExtractor for RuleChain {
    type Output = ExtractionMatch<String>;

    fn extract(&self, root: &XmlElement) -> Option<Self::Output> {
        self.0.iter().enumerate().find_map(|(rank, rule)| {
            rule.lookup(root)
                .map(|value| ExtractionMatch::new(value.to_string(), rank, rule.to_string()))
        })
    }
}

/// Spelling variants of one attribute on the document element.
#[derive(Debug, Clone, Copy)]
pub struct RootAttribute(pub &'static [&'static str]);

impl FieldExtractor for RootAttribute {
    type Output = ExtractionMatch<String>;

    fn extract(&self, root: &XmlElement) -> Option<Self::Output> {
        self.0.iter().enumerate().find_map(|(rank, name)| {
            root.attribute(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| ExtractionMatch::new(value.to_string(), rank, format!("@{}", name)))
        })
    }
}

/// Resolve a textual field through an ordered rule list, falling back to
/// [`UNKNOWN`]. Never fails.
pub fn resolve(root: &XmlElement, rules: &[LookupRule]) -> String {
    rules
        .iter()
        .find_map(|rule| rule.lookup(root))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pretty_assertions::assert_eq;

    fn doc(xml: &str) -> XmlDocument {
        XmlDocument::parse(xml).unwrap()
    }

    #[test]
    fn test_resolve_prefers_namespaced_issuer() {
        let d = doc(r#"
            <cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4">
                <Emisor Nombre="Bare Name"/>
                <cfdi:Emisor Nombre="Namespaced Name" Rfc="NS010101AAA"/>
                <RazonSocial>Razon</RazonSocial>
            </cfdi:Comprobante>"#);

        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), "Namespaced Name");
        assert_eq!(resolve(d.root(), TAX_ID_RULES), "NS010101AAA");
    }

    #[test]
    fn test_resolve_falls_through_empty_values() {
        let d = doc(r#"
            <Factura>
                <Emisor Nombre=""/>
                <proveedor Nombre="Proveedor SA" RFC="PRO010101AAA"/>
            </Factura>"#);

        let chain = RuleChain(ISSUER_NAME_RULES);
        let found = chain.extract(d.root()).unwrap();
        assert_eq!(found.value, "Proveedor SA");
        assert_eq!(found.rank, 2);
        assert_eq!(resolve(d.root(), TAX_ID_RULES), "PRO010101AAA");
    }

    #[test]
    fn test_resolve_text_rules() {
        let d = doc("<Factura><datos><razonSocial>  Textual SA </razonSocial><rfc>TXT010101AAA</rfc></datos></Factura>");
        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), "Textual SA");
        assert_eq!(resolve(d.root(), TAX_ID_RULES), "TXT010101AAA");
    }

    #[test]
    fn test_empty_text_does_not_mask_later_rules() {
        let d = doc("<Factura><nombreProveedor/><Nombre>Later</Nombre></Factura>");
        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), "Later");
    }

    #[test]
    fn test_resolve_missing_returns_sentinel() {
        let d = doc("<Factura><Otro/></Factura>");
        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), UNKNOWN);
        assert_eq!(resolve(d.root(), TAX_ID_RULES), UNKNOWN);
        assert_eq!(resolve(d.root(), &[]), UNKNOWN);
    }

    #[test]
    fn test_bare_rule_ignores_namespaced_element() {
        let d = doc(r#"<a xmlns:x="urn:other"><x:Emisor Nombre="Other NS"/></a>"#);
        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), UNKNOWN);
    }

    #[test]
    fn test_root_attribute_variants() {
        let d = doc(r#"<Factura fecha="" fechaEmision="2024-05-01" numero="77"/>"#);

        let date = RootAttribute(DATE_ATTRIBUTES).extract(d.root()).unwrap();
        assert_eq!(date.value, "2024-05-01");
        assert_eq!(date.source, "@fechaEmision");

        let number = RootAttribute(INVOICE_NUMBER_ATTRIBUTES).extract(d.root()).unwrap();
        assert_eq!(number.value, "77");

        assert!(RootAttribute(TOTAL_ATTRIBUTES).extract(d.root()).is_none());
    }

    #[test]
    fn test_root_element_is_not_a_descendant() {
        let d = doc(r#"<Emisor Nombre="Root itself"/>"#);
        assert_eq!(resolve(d.root(), ISSUER_NAME_RULES), UNKNOWN);
    }
}
