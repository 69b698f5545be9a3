//! Builds an [`XmlDocument`] from quick-xml's namespace-aware event stream.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use tracing::trace;

use super::{XmlDocument, XmlElement};
use crate::error::ExtractionErrorKind;

/// Parse a whole document into an owned element tree.
pub fn parse_document(xml: &str) -> Result<XmlDocument, ExtractionErrorKind> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = namespace_uri(resolved)?;

        match event {
            Event::Start(e) => {
                stack.push(open_element(namespace, &e)?);
            }
            Event::Empty(e) => {
                let element = open_element(namespace, &e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(e) => {
                let element = stack.pop().ok_or_else(|| {
                    ExtractionErrorKind::Structure(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                push_text(&mut stack, &utf8(&e)?)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ExtractionErrorKind::Structure(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    let root = root.ok_or_else(|| {
        ExtractionErrorKind::Structure("document has no root element".to_string())
    })?;
    trace!("Parsed document with root <{}>", root.name);

    Ok(XmlDocument::new(root))
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>, ExtractionErrorKind> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(utf8(ns.0)?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ExtractionErrorKind::Structure(format!(
            "unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open_element(
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement, ExtractionErrorKind> {
    let mut element = XmlElement::new(namespace, utf8(start.local_name().as_ref())?);

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        element.attributes.insert(key, value);
    }

    Ok(element)
}

/// Append character data to the open element. Outside the document element
/// only whitespace is allowed.
fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), ExtractionErrorKind> {
    match stack.last_mut() {
        Some(current) => current.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(ExtractionErrorKind::Structure(
                "text outside the document element".to_string(),
            ));
        }
    }
    Ok(())
}

/// Hand a finished element to its parent, or make it the root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ExtractionErrorKind> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ExtractionErrorKind::Structure(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String, ExtractionErrorKind> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ExtractionErrorKind::Structure(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CFDI_NS: &str = "http://www.sat.gob.mx/cfd/4";

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Folio="A-1">
                <cfdi:Emisor Rfc="AAA010101AAA" Nombre="ACME &amp; Co"/>
                <Nota>hola</Nota>
            </cfdi:Comprobante>"#;

        let doc = parse_document(xml).unwrap();
        let root = doc.root();
        assert!(root.is(Some(CFDI_NS), "Comprobante"));
        assert_eq!(root.attribute("Folio"), Some("A-1"));
        assert_eq!(root.attributes.get("xmlns:cfdi"), None);

        let emisor = &root.children[0];
        assert!(emisor.is(Some(CFDI_NS), "Emisor"));
        assert_eq!(emisor.attribute("Nombre"), Some("ACME & Co"));

        let nota = &root.children[1];
        assert!(nota.is(None, "Nota"));
        assert_eq!(nota.text(), "hola");
    }

    #[test]
    fn test_parse_default_namespace() {
        let doc = parse_document(r#"<a xmlns="urn:d"><b/></a>"#).unwrap();
        assert!(doc.root().children[0].is(Some("urn:d"), "b"));
    }

    #[test]
    fn test_parse_cdata_text() {
        let doc = parse_document("<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(doc.root().text(), "x < y");
    }

    #[test]
    fn test_parse_rejects_unclosed() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a><b>").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_and_junk() {
        assert!(parse_document("").is_err());
        assert!(parse_document("not xml at all").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }

    #[test]
    fn test_parse_rejects_cdata_outside_root() {
        assert!(matches!(
            parse_document("<![CDATA[junk]]><a/>"),
            Err(ExtractionErrorKind::Structure(_))
        ));
        assert!(matches!(
            parse_document("<a/><![CDATA[junk]]>"),
            Err(ExtractionErrorKind::Structure(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unbound_prefix() {
        assert!(parse_document("<x:a/>").is_err());
    }
}
