//! Datetime parsing and duration formatting shared by the timer core,
//! the activity renderer and the payment aggregator.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};

/// Canonical storage format for entry timestamps.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time, truncated to whole seconds so stored and reloaded
/// values compare equal.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().with_nanosecond(0).unwrap()
}

pub fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Entry timestamps are rendered as UTC ISO 8601 in audit log exports.
pub fn fmt_dt_iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// Parse a client-supplied datetime into the canonical representation.
/// Accepts the storage format plus the ISO variants frontends send.
pub fn parse_dt(raw: &str) -> AppResult<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    const FORMATS: [&str; 6] = [
        DATETIME_FMT,
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.with_nanosecond(0).unwrap());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap());
    }
    Err(AppError::InvalidDate(raw.to_string()))
}

pub fn parse_optional_dt(raw: Option<&str>) -> AppResult<Option<NaiveDateTime>> {
    match raw {
        Some(s) if !s.trim().is_empty() => parse_dt(s).map(Some),
        _ => Ok(None),
    }
}

/// `HH:MM:SS` rendering used for entry durations and activity descriptions.
/// Negative inputs are treated as their absolute value.
pub fn format_duration(seconds: i64) -> String {
    let secs = seconds.abs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Compact tracked-time rendering for totals: `"3h 25m"`, `"45m"`, and
/// `"1.2k h"` once the hour count reaches 1000.
pub fn format_tracked_hours(seconds: i64) -> String {
    let secs = seconds.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    if hours >= 1000 {
        return format!("{:.1}k h", hours as f64 / 1000.0);
    }

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Human-relative timestamp for broadcast payloads and the activity feed.
pub fn time_ago(from: NaiveDateTime, now: NaiveDateTime) -> String {
    let secs = (now - from).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }
    match secs {
        0..=59 => format!("{} seconds ago", secs),
        60..=3599 => format!("{} minutes ago", secs / 60),
        3600..=86_399 => format!("{} hours ago", secs / 3600),
        _ => format!("{} days ago", secs / 86_400),
    }
}
