//! Candidate locations for every invoice field, in priority order.

use super::LookupRule;

/// CFDI 4.0 namespace.
pub const CFDI_NS: &str = "http://www.sat.gob.mx/cfd/4";

const CFDI: &[(&str, &str)] = &[("cfdi", CFDI_NS)];

/// Issuer name: namespaced CFDI issuer first, then bare tags in both
/// casing conventions.
pub const ISSUER_NAME_RULES: &[LookupRule] = &[
    LookupRule::attribute(".//cfdi:Emisor", CFDI, "Nombre"),
    LookupRule::attribute(".//Emisor", &[], "Nombre"),
    LookupRule::attribute(".//proveedor", &[], "Nombre"),
    LookupRule::text(".//nombreProveedor"),
    LookupRule::text(".//NombreProveedor"),
    LookupRule::text(".//razonSocial"),
    LookupRule::text(".//RazonSocial"),
    LookupRule::text(".//Nombre"),
    LookupRule::text(".//nombre"),
];

/// Issuer tax identifier (RFC).
pub const TAX_ID_RULES: &[LookupRule] = &[
    LookupRule::attribute(".//cfdi:Emisor", CFDI, "Rfc"),
    LookupRule::attribute(".//Emisor", &[], "Rfc"),
    LookupRule::attribute(".//proveedor", &[], "RFC"),
    LookupRule::attribute(".//nombreProveedor", &[], "RFC"),
    LookupRule::text(".//Rfc"),
    LookupRule::text(".//rfc"),
];

/// Transferred tax amount. A single fixed location.
pub const TAX_TRANSFER_RULE: LookupRule = LookupRule::attribute(
    ".//cfdi:Impuestos/cfdi:Traslados/cfdi:Traslado",
    CFDI,
    "Importe",
);

/// Issue date attribute on the document element.
pub const DATE_ATTRIBUTES: &[&str] = &["Fecha", "fecha", "fechaEmision"];

/// Invoice number attribute on the document element.
pub const INVOICE_NUMBER_ATTRIBUTES: &[&str] = &["Folio", "folio", "numero"];

/// Subtotal attribute on the document element.
pub const SUBTOTAL_ATTRIBUTES: &[&str] = &["SubTotal", "subTotal"];

/// Total attribute on the document element.
pub const TOTAL_ATTRIBUTES: &[&str] = &["Total", "total"];
