//! Ledger table, batch aggregation and persistence.

pub mod dates;
mod store;

pub use dates::{date_families, has_mixed_date_formats, DateFamily};
pub use store::{CsvLedgerStore, LedgerStore};

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::invoice::InvoiceRecord;

/// Canonical column headers, in order.
pub const COLUMNS: [&str; 7] = [
    "Date",
    "InvoiceNumber",
    "IssuerName",
    "TaxID",
    "SubTotal",
    "TaxAmount",
    "Total",
];

/// Header of the derived running-total column.
pub const SUM_COLUMN: &str = "SumOfTotals";

/// Ordered invoice rows plus the derived sum of all totals.
///
/// The sum is stored once and reported for every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTable {
    rows: Vec<InvoiceRecord>,
    sum_of_totals: Decimal,
}

impl LedgerTable {
    /// Empty table with the canonical columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding `rows` as given; only the derived sum is computed.
    ///
    /// The sum saturates at `Decimal::MAX` instead of overflowing.
    pub fn from_rows(rows: Vec<InvoiceRecord>) -> Self {
        let sum_of_totals = rows
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.total))
            .unwrap_or_else(|| {
                warn!("Sum of totals exceeds the representable range, capping it");
                Decimal::MAX
            });
        Self {
            rows,
            sum_of_totals,
        }
    }

    pub fn rows(&self) -> &[InvoiceRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the `total` column.
    pub fn sum_of_totals(&self) -> Decimal {
        self.sum_of_totals
    }

    /// Rows paired with the derived column value.
    pub fn iter_with_sum(&self) -> impl Iterator<Item = (&InvoiceRecord, Decimal)> + '_ {
        self.rows.iter().map(move |row| (row, self.sum_of_totals))
    }

    pub fn into_rows(self) -> Vec<InvoiceRecord> {
        self.rows
    }
}

/// Merge new records into an existing table.
///
/// Exact duplicates across all seven fields collapse to their first
/// occurrence, the sum of totals is recomputed, and rows are sorted by the
/// raw date text, newest first. Dates are compared as strings: the order is
/// only chronological when every row uses the same representation (see
/// [`has_mixed_date_formats`]).
pub fn aggregate(
    existing: LedgerTable,
    new_records: impl IntoIterator<Item = InvoiceRecord>,
) -> LedgerTable {
    let before = existing.len();
    let mut seen: HashSet<InvoiceRecord> = HashSet::new();

    let mut rows: Vec<InvoiceRecord> = existing
        .into_rows()
        .into_iter()
        .chain(new_records)
        .filter(|record| seen.insert(record.clone()))
        .collect();

    rows.sort_by(|a, b| b.date.cmp(&a.date));

    debug!("Aggregated ledger: {} rows before, {} after", before, rows.len());
    LedgerTable::from_rows(rows)
}
