//! Document extractor: seven field resolutions plus amount parsing per file.

use std::fs;
use std::path::Path;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, ExtractionErrorKind};
use crate::models::config::{AmountPolicy, ExtractionConfig};
use crate::models::invoice::{InvoiceRecord, UNKNOWN};
use crate::xml::XmlDocument;

use super::rules::{
    AmountValue, ExtractionMatch, FieldExtractor, RootAttribute, RuleChain, DATE_ATTRIBUTES,
    INVOICE_NUMBER_ATTRIBUTES, ISSUER_NAME_RULES, SUBTOTAL_ATTRIBUTES, TAX_ID_RULES,
    TAX_TRANSFER_RULE, TOTAL_ATTRIBUTES,
};
use super::{InvoiceExtractor, Result};

/// Result of extracting one document.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted record.
    pub record: InvoiceRecord,
    /// Fields that fell back to a sentinel or were defaulted.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extracts an [`InvoiceRecord`] from CFDI-style XML.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor {
    amount_policy: AmountPolicy,
}

impl DocumentExtractor {
    /// Create an extractor that defaults unusable amounts to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_amount_policy(config.amount_policy)
    }

    /// Set the policy for present-but-invalid root amounts.
    pub fn with_amount_policy(mut self, policy: AmountPolicy) -> Self {
        self.amount_policy = policy;
        self
    }

    /// Resolve all fields of an already parsed document.
    pub fn extract_document(
        &self,
        doc: &XmlDocument,
    ) -> std::result::Result<(InvoiceRecord, Vec<String>), ExtractionErrorKind> {
        let root = doc.root();
        let mut warnings = Vec::new();

        let date = text_field("date", RootAttribute(DATE_ATTRIBUTES).extract(root), &mut warnings);
        let invoice_number = text_field(
            "invoice_number",
            RootAttribute(INVOICE_NUMBER_ATTRIBUTES).extract(root),
            &mut warnings,
        );
        let issuer_name = text_field(
            "issuer_name",
            RuleChain(ISSUER_NAME_RULES).extract(root),
            &mut warnings,
        );
        let tax_id = text_field("tax_id", RuleChain(TAX_ID_RULES).extract(root), &mut warnings);

        let subtotal = self.root_amount(
            "subtotal",
            RootAttribute(SUBTOTAL_ATTRIBUTES).extract(root),
            &mut warnings,
        )?;
        let total = self.root_amount(
            "total",
            RootAttribute(TOTAL_ATTRIBUTES).extract(root),
            &mut warnings,
        )?;

        // Always zero on failure, whatever the policy.
        let tax_amount = match AmountValue::from_raw(TAX_TRANSFER_RULE.lookup(root)) {
            AmountValue::Parsed(amount) => amount,
            AmountValue::Missing => Decimal::ZERO,
            AmountValue::Invalid(value) => {
                warnings.push(format!("tax_amount: invalid value {:?}, using 0", value));
                Decimal::ZERO
            }
        };

        let record = InvoiceRecord::new(
            date,
            invoice_number,
            issuer_name,
            tax_id,
            subtotal,
            tax_amount,
            total,
        );
        Ok((record, warnings))
    }

    fn root_amount(
        &self,
        field: &'static str,
        found: Option<ExtractionMatch<String>>,
        warnings: &mut Vec<String>,
    ) -> std::result::Result<Decimal, ExtractionErrorKind> {
        match AmountValue::from_raw(found.as_ref().map(|m| m.value.as_str())) {
            AmountValue::Parsed(amount) => Ok(amount),
            AmountValue::Missing => {
                warnings.push(format!("{}: not found, using 0", field));
                Ok(Decimal::ZERO)
            }
            AmountValue::Invalid(value) => match self.amount_policy {
                AmountPolicy::DefaultToZero => {
                    warnings.push(format!("{}: invalid value {:?}, using 0", field, value));
                    Ok(Decimal::ZERO)
                }
                AmountPolicy::Reject => Err(ExtractionErrorKind::InvalidAmount { field, value }),
            },
        }
    }
}

fn text_field(
    field: &str,
    found: Option<ExtractionMatch<String>>,
    warnings: &mut Vec<String>,
) -> String {
    match found {
        Some(m) => {
            debug!("{} resolved from {} (candidate {})", field, m.source, m.rank);
            m.value
        }
        None => {
            warnings.push(format!("{}: no candidate matched, using {}", field, UNKNOWN));
            UNKNOWN.to_string()
        }
    }
}

impl InvoiceExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let xml = fs::read_to_string(path).map_err(|e| ExtractionError::new(path, e))?;
        self.extract_str(path, &xml)
    }

    fn extract_str(&self, path: &Path, xml: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        let doc = XmlDocument::parse(xml).map_err(|kind| ExtractionError::new(path, kind))?;
        let (record, warnings) = self
            .extract_document(&doc)
            .map_err(|kind| ExtractionError::new(path, kind))?;

        for warning in &warnings {
            warn!("{}: {}", path.display(), warning);
        }
        info!(
            "Extracted invoice {} from {} ({} warnings)",
            record.invoice_number,
            path.display(),
            warnings.len()
        );

        Ok(ExtractionResult {
            record,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
