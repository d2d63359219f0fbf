//! Helpers for the loosely typed fields providers send back.

use chrono::{DateTime, NaiveDate, Utc};
use hype_core::ProviderError;

/// Numbers sent as strings, e.g. `"182.52"`, `"0.45%"`, `"None"` or `"-"`.
pub(crate) fn number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    match trimmed {
        "" | "-" | "None" | "null" | "N/A" => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

pub(crate) fn required_number(raw: &str, field: &str) -> Result<f64, ProviderError> {
    number(raw).ok_or_else(|| ProviderError::Malformed(format!("{field}: '{raw}' is not a number")))
}

/// Blank strings and placeholder values become `None`.
pub(crate) fn text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "None" && s != "-")
}

/// Share volume; negative or non-finite values are rejected, not clamped.
pub(crate) fn volume(raw: f64) -> Result<u64, ProviderError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(ProviderError::InvalidData(format!("volume {raw} is negative or not finite")));
    }
    Ok(raw.round() as u64)
}

pub(crate) fn date(raw: &str) -> Result<NaiveDate, ProviderError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ProviderError::Malformed(format!("bad date '{raw}': {e}")))
}

pub(crate) fn unix_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

pub(crate) fn unix_date(secs: i64) -> Option<NaiveDate> {
    unix_datetime(secs).map(|dt| dt.date_naive())
}
