//! Ledger persistence.

use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info};

use super::{LedgerTable, COLUMNS, SUM_COLUMN};
use crate::error::PersistenceError;
use crate::invoice::rules::parse_amount;
use crate::models::invoice::InvoiceRecord;

/// Loads and saves the ledger table.
pub trait LedgerStore {
    /// Load the table at `path`. A missing file yields an empty table.
    fn load(&self, path: &Path) -> Result<LedgerTable, PersistenceError>;

    /// Overwrite `path` with `table`.
    fn save(&self, path: &Path, table: &LedgerTable) -> Result<(), PersistenceError>;
}

/// CSV ledger: the seven canonical columns followed by `SumOfTotals`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLedgerStore;

impl CsvLedgerStore {
    pub fn new() -> Self {
        Self
    }
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self, path: &Path) -> Result<LedgerTable, PersistenceError> {
        if !path.exists() {
            debug!("No ledger at {}, starting empty", path.display());
            return Ok(LedgerTable::new());
        }

        let load_err = |reason: String| PersistenceError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::Reader::from_path(path).map_err(|e| load_err(e.to_string()))?;
        let headers = reader.headers().map_err(|e| load_err(e.to_string()))?.clone();

        // Header positions, so column order in an edited ledger does not matter.
        let mut positions = [0usize; 7];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| load_err(format!("missing column {}", column)))?;
        }

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|e| load_err(e.to_string()))?;
            // Header is line 1.
            let row = parse_row(&record, &positions).map_err(|reason| {
                load_err(format!("row {}: {}", line + 2, reason))
            })?;
            rows.push(row);
        }

        info!("Loaded {} ledger rows from {}", rows.len(), path.display());
        Ok(LedgerTable::from_rows(rows))
    }

    fn save(&self, path: &Path, table: &LedgerTable) -> Result<(), PersistenceError> {
        let tmp = temp_path(path);

        if let Err(reason) = write_table(&tmp, table) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::Save {
                path: path.to_path_buf(),
                reason,
            });
        }

        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            PersistenceError::Save {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        info!("Saved {} ledger rows to {}", table.len(), path.display());
        Ok(())
    }
}

fn parse_row(record: &StringRecord, positions: &[usize; 7]) -> Result<InvoiceRecord, String> {
    let field = |i: usize| record.get(positions[i]).unwrap_or("").trim();
    let amount = |i: usize| {
        let raw = field(i);
        if raw.is_empty() {
            return Ok(rust_decimal::Decimal::ZERO);
        }
        parse_amount(raw).ok_or_else(|| format!("invalid {} value {:?}", COLUMNS[i], raw))
    };

    Ok(InvoiceRecord::new(
        field(0),
        field(1),
        field(2),
        field(3),
        amount(4)?,
        amount(5)?,
        amount(6)?,
    ))
}

fn write_table(path: &Path, table: &LedgerTable) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| e.to_string())?;

    let mut header: Vec<&str> = COLUMNS.to_vec();
    header.push(SUM_COLUMN);
    wtr.write_record(&header).map_err(|e| e.to_string())?;

    for (row, sum) in table.iter_with_sum() {
        wtr.write_record([
            row.date.as_str(),
            &row.invoice_number,
            &row.issuer_name,
            &row.tax_id,
            &row.subtotal.to_string(),
            &row.tax_amount.to_string(),
            &row.total.to_string(),
            &sum.to_string(),
        ])
        .map_err(|e| e.to_string())?;
    }

    wtr.flush().map_err(|e| e.to_string())
}

/// Sibling file the table is written to before replacing the ledger.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".tmp");
    path.with_file_name(name)
}
