//! Core library for CFDI-style XML invoice consolidation.
//!
//! This crate provides:
//! - A namespace-aware XML element tree
//! - Ordered-rule field resolution over heterogeneous invoice schemas
//! - Per-file invoice extraction with explicit amount handling
//! - Ledger aggregation (dedup, running total, date ordering) and CSV persistence
//! - A processing session that ties the above together for one run

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod session;
pub mod xml;

pub use error::{
    ExtractionError, ExtractionErrorKind, LedgerError, PersistenceError, Result, SessionError,
};
pub use invoice::rules::{resolve, LookupRule, ValueSource};
pub use invoice::{DocumentExtractor, ExtractionResult, InvoiceExtractor};
pub use ledger::{aggregate, CsvLedgerStore, LedgerStore, LedgerTable};
pub use models::config::{AmountPolicy, LedgerConfig};
pub use models::invoice::{InvoiceRecord, UNKNOWN};
pub use session::{BatchReport, NoProgress, ProgressSink, SaveOutcome, Session};
pub use xml::{XmlDocument, XmlElement};
