//! Date-range parsing for payment queries and exports.
//!
//! Clients send ranges as `"YYYY-MM-DD to YYYY-MM-DD"`; the second half may
//! be omitted, in which case the range runs to the end of the current day.

use crate::errors::{AppError, AppResult};
use crate::utils::time::now;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn parse_day(raw: &str) -> AppResult<NaiveDate> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    if !re.is_match(raw) {
        return Err(AppError::InvalidRange(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidRange(raw.to_string()))
}

/// Parse `"start to end"` into an inclusive day range. The start is anchored
/// at 00:00:00, the end at 23:59:59.
pub fn parse_date_range(raw: &str) -> AppResult<DateRange> {
    let mut parts = raw.splitn(2, " to ");
    let start_raw = parts.next().unwrap_or("").trim();
    let end_raw = parts.next().map(str::trim);

    if start_raw.is_empty() {
        return Err(AppError::InvalidRange(raw.to_string()));
    }

    let start = parse_day(start_raw)?.and_hms_opt(0, 0, 0).unwrap();
    let end = match end_raw {
        Some(day) if !day.is_empty() => parse_day(day)?.and_hms_opt(23, 59, 59).unwrap(),
        _ => now().date().and_hms_opt(23, 59, 59).unwrap(),
    };

    if end < start {
        return Err(AppError::InvalidRange(raw.to_string()));
    }

    Ok(DateRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_parses_day_bounds() {
        let range = parse_date_range("2025-06-01 to 2025-06-30").unwrap();
        assert_eq!(range.start.format("%H:%M:%S").to_string(), "00:00:00");
        assert_eq!(range.end.format("%H:%M:%S").to_string(), "23:59:59");
        assert_eq!(range.start.date().to_string(), "2025-06-01");
        assert_eq!(range.end.date().to_string(), "2025-06-30");
    }

    #[test]
    fn open_range_ends_today() {
        let range = parse_date_range("2025-06-01").unwrap();
        assert_eq!(range.end.date(), now().date());
    }

    #[test]
    fn rejects_malformed_and_inverted_ranges() {
        assert!(parse_date_range("06/01/2025 to 06/30/2025").is_err());
        assert!(parse_date_range("2025-06-30 to 2025-06-01").is_err());
        assert!(parse_date_range("").is_err());
    }
}
