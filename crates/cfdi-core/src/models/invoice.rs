//! Invoice record: one row of the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder stored in a textual field when no candidate location yields a value.
pub const UNKNOWN: &str = "Unknown";

/// The seven fields extracted from one invoice document.
///
/// Equality and hashing cover all seven fields, which is what duplicate
/// collapsing in the ledger relies on. `Decimal` compares numerically, so
/// `100.5` and `100.50` are the same amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Issue date exactly as written in the document.
    pub date: String,

    /// Invoice number (folio).
    pub invoice_number: String,

    /// Issuer (supplier) name.
    pub issuer_name: String,

    /// Issuer tax identifier (RFC).
    pub tax_id: String,

    /// Amount before taxes.
    pub subtotal: Decimal,

    /// Transferred tax amount (IVA).
    pub tax_amount: Decimal,

    /// Amount including taxes.
    pub total: Decimal,
}

impl InvoiceRecord {
    /// Build a record, replacing empty textual fields with [`UNKNOWN`] and
    /// negative amounts with zero.
    pub fn new(
        date: impl Into<String>,
        invoice_number: impl Into<String>,
        issuer_name: impl Into<String>,
        tax_id: impl Into<String>,
        subtotal: Decimal,
        tax_amount: Decimal,
        total: Decimal,
    ) -> Self {
        Self {
            date: or_unknown(date.into()),
            invoice_number: or_unknown(invoice_number.into()),
            issuer_name: or_unknown(issuer_name.into()),
            tax_id: or_unknown(tax_id.into()),
            subtotal: subtotal.max(Decimal::ZERO),
            tax_amount: tax_amount.max(Decimal::ZERO),
            total: total.max(Decimal::ZERO),
        }
    }

    /// Names of the textual fields that hold the sentinel.
    pub fn unknown_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.date == UNKNOWN {
            fields.push("date");
        }
        if self.invoice_number == UNKNOWN {
            fields.push("invoice_number");
        }
        if self.issuer_name == UNKNOWN {
            fields.push("issuer_name");
        }
        if self.tax_id == UNKNOWN {
            fields.push("tax_id");
        }
        fields
    }
}

fn or_unknown(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
