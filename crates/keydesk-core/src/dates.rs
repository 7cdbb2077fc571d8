//! Calendar-day arithmetic and the two fixed date formats.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta};

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Add `n` calendar days (negative `n` subtracts). Saturates at the
/// representable date range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    TimeDelta::try_days(n)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// `DD-MM-YYYY`, shown to users.
pub fn format_display(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// `YYYY-MM-DD`, sent to the licensing API.
pub fn format_api(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse an expiration value as reported by the licensing API.
///
/// Accepts RFC 3339 timestamps (converted to the local calendar), naive
/// timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_remote(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
