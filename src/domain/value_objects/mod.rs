//! Value objects for order revenue

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Reference to an uploaded proof of payment. Its presence marks an order as paid.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofOfPayment(String);

impl ProofOfPayment {
    pub fn new(value: impl Into<String>) -> Result<Self, ProofError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ProofError::Empty); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProofOfPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum ProofError { Empty }
impl std::error::Error for ProofError {}
impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Proof of payment empty") }
}

/// Whole percentage in `0..=100`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// `count / total` as a rounded percentage. A non-positive total yields 0.
    pub fn of(count: i64, total: i64) -> Self {
        if total <= 0 { return Self(0); }
        let count = i128::from(count.max(0));
        let total = i128::from(total);
        // round half up: (200c + t) / 2t
        let rounded = (count * 200 + total) / (total * 2);
        Self(rounded.clamp(0, 100) as u8)
    }
    pub fn value(&self) -> u8 { self.0 }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0) }
}

/// Reads a monetary amount from a JSON number or numeric string. Anything else is zero.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() { return None; }
            Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
        }
        _ => None,
    }
}

/// Adds an order amount to a running revenue total, clamping at the `Decimal` bounds.
pub fn add_revenue(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!(%total, %amount, "revenue total overflowed, clamping");
        if amount.is_sign_negative() { Decimal::MIN } else { Decimal::MAX }
    })
}

/// Earliest and latest calendar years an order timestamp or reference instant may fall in.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1970..=9999;

/// Whether calendar arithmetic on `at` stays clear of chrono's representable range.
pub fn is_supported_instant(at: DateTime<Utc>) -> bool { SUPPORTED_YEARS.contains(&at.naive_utc().year()) }

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an order timestamp.
///
/// Accepts RFC 3339 (any offset), naive date-times interpreted as wall-clock
/// time in `tz`, and bare `YYYY-MM-DD` dates taken as local midnight. Years
/// outside [`SUPPORTED_YEARS`] are treated as unparsable.
pub fn parse_timestamp(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc)).filter(|at| is_supported_instant(*at));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
        .filter(|naive| SUPPORTED_YEARS.contains(&naive.year()))
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
