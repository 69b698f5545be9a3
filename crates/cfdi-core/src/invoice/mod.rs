//! Invoice field extraction module.

mod extractor;
pub mod rules;

pub use extractor::{DocumentExtractor, ExtractionResult};

use std::path::Path;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice field extractors.
pub trait InvoiceExtractor {
    /// Read and extract one invoice file.
    fn extract(&self, path: &Path) -> Result<ExtractionResult>;

    /// Extract from an in-memory document; `path` only labels errors.
    fn extract_str(&self, path: &Path, xml: &str) -> Result<ExtractionResult>;
}
