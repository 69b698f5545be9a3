//! Monetary value parsing.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Outcome of reading one monetary source value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountValue {
    /// A non-negative decimal.
    Parsed(Decimal),
    /// No source value was present.
    Missing,
    /// A value was present but is not a usable amount.
    Invalid(String),
}

impl AmountValue {
    /// Classify an optional raw attribute value.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => AmountValue::Missing,
            Some(value) => match parse_amount(value) {
                Some(amount) => AmountValue::Parsed(amount),
                None => AmountValue::Invalid(value.to_string()),
            },
        }
    }
}

/// Exclusive upper bound for an amount: at most 18 integer digits.
pub const AMOUNT_LIMIT: u64 = 1_000_000_000_000_000_000;

/// Parse a plain decimal amount (`1234.56`). Negative values and values of
/// [`AMOUNT_LIMIT`] or more are rejected.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let amount = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()?;
    if amount.is_zero() {
        return Some(Decimal::ZERO);
    }
    (!amount.is_sign_negative() && amount < Decimal::from(AMOUNT_LIMIT)).then_some(amount)
}
