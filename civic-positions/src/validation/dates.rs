//! Term date parsing

use chrono::{Duration, NaiveDate};

/// Day zero of spreadsheet serial dates (1900 date system, leap-year bug included)
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Parse a term date under the configured formats
///
/// Also accepts a spreadsheet serial day number ("45292" or "45292.0"), which
/// is what a date cell degrades to when exported without formatting.
pub fn parse_term_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    let serial = raw.strip_suffix(".0").unwrap_or(raw);
    if serial.len() == 5 && serial.chars().all(|c| c.is_ascii_digit()) {
        let days: i64 = serial.parse().ok()?;
        return serial_epoch()?.checked_add_signed(Duration::days(days));
    }

    None
}
