//! Date representation checks.
//!
//! The ledger sorts dates as raw text. That is chronological only when all
//! rows share one representation, so these helpers detect mixed
//! representations for the operator. Dates are never rewritten.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::invoice::{InvoiceRecord, UNKNOWN};

/// Textual representation families that sort consistently among themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateFamily {
    /// `YYYY-MM-DD`, optionally followed by `THH:MM:SS`.
    Iso,
    /// `DD/MM/YYYY`, `DD-MM-YYYY` or `DD.MM.YYYY`.
    DayFirst,
    /// Anything else that is not the sentinel.
    Unrecognized,
}

const ISO_DATE_TIME: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const ISO_DATE: &str = "%Y-%m-%d";
const DAY_FIRST: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

impl DateFamily {
    /// Classify a raw date; `None` for the sentinel.
    pub fn classify(date: &str) -> Option<Self> {
        let date = date.trim();
        if date == UNKNOWN {
            return None;
        }

        let iso = NaiveDate::parse_from_str(date, ISO_DATE).is_ok()
            || ISO_DATE_TIME
                .iter()
                .any(|fmt| NaiveDateTime::parse_from_str(date, fmt).is_ok());
        if iso {
            return Some(DateFamily::Iso);
        }

        if DAY_FIRST
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(date, fmt).is_ok())
        {
            return Some(DateFamily::DayFirst);
        }

        Some(DateFamily::Unrecognized)
    }
}

/// Families present among the rows' dates.
pub fn date_families(rows: &[InvoiceRecord]) -> BTreeSet<DateFamily> {
    rows.iter()
        .filter_map(|r| DateFamily::classify(&r.date))
        .collect()
}

/// True when the date column mixes representations, making the sort order
/// unreliable.
pub fn has_mixed_date_formats(rows: &[InvoiceRecord]) -> bool {
    date_families(rows).len() > 1
}
