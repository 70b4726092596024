//! Macro Tracker tools
//!
//! Request-level operations behind the MCP tools. Each one takes a pooled
//! connection, reads a snapshot from the store, and hands it to the pure
//! `nutrition` functions. Errors come back as human-readable strings.

pub mod account;
pub mod entries;
pub mod goals;
pub mod progress;
pub mod status;

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Years a tool date may fall in
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1900..=9999;

/// Parse a `YYYY-MM-DD` calendar date within `SUPPORTED_YEARS`
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    if !SUPPORTED_YEARS.contains(&date.year()) {
        return Err(format!(
            "Date '{}' is out of range, years {}-{} are supported",
            s,
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end()
        ));
    }
    Ok(date)
}

/// Parse an instant. RFC 3339 with an offset is taken as-is; a bare local
/// date-time (`2026-10-18T12:30` or `2026-10-18 12:30:00`) is read in `tz`.
pub fn parse_instant<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const LOCAL_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Invalid timestamp '{}', expected RFC 3339 or YYYY-MM-DDTHH:MM", s))
}
