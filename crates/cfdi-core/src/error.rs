//! Error types for the cfdi-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the cfdi library.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A single document could not be turned into a record.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The ledger could not be loaded or saved.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// A processing run was started in an unusable state.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure to extract one invoice file. Carries the offending path so a batch
/// can report it without aborting.
#[derive(Error, Debug)]
#[error("{}: {kind}", .path.display())]
pub struct ExtractionError {
    /// File the error belongs to.
    pub path: PathBuf,
    /// What went wrong.
    pub kind: ExtractionErrorKind,
}

impl ExtractionError {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<ExtractionErrorKind>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// True when the document itself was not well-formed XML.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self.kind,
            ExtractionErrorKind::Parse(_)
                | ExtractionErrorKind::Attribute(_)
                | ExtractionErrorKind::Structure(_)
        )
    }
}

/// Causes of a per-file extraction failure.
#[derive(Error, Debug)]
pub enum ExtractionErrorKind {
    /// File could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Parse(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Tags do not nest properly or the document has no root element.
    #[error("malformed XML: {0}")]
    Structure(String),

    /// A monetary value is present but is not a non-negative decimal.
    #[error("invalid amount for {field}: {value:?}")]
    InvalidAmount { field: &'static str, value: String },
}

/// Errors loading or saving the ledger table.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// An existing ledger could not be read. A missing ledger is not an error.
    #[error("failed to load ledger {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// The ledger could not be written (locked, read-only, missing directory...).
    #[error("failed to save ledger {}: {reason}", .path.display())]
    Save { path: PathBuf, reason: String },
}

/// Errors raised before a processing run starts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// No ledger destination was chosen.
    #[error("no ledger path selected")]
    NoLedgerPath,

    /// No files are queued.
    #[error("no invoice files queued")]
    NothingQueued,
}

/// Result type for the cfdi library.
pub type Result<T> = std::result::Result<T, LedgerError>;
