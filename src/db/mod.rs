//! Database module
//!
//! Handles SQLite connection, migrations and timestamp encoding.

pub mod connection;
pub mod migrations;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub use connection::{Database, DbError, DbResult};

/// Encode a timestamp for storage: `2026-10-18T07:30:00.000Z`.
///
/// Fixed width, so `ORDER BY` and range comparisons on the text column are
/// chronological.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Read a stored timestamp column
pub fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(&raw).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::milliseconds(120);
        assert_eq!(format_timestamp(&a), "2026-01-02T03:04:05.000Z");
        assert_eq!(format_timestamp(&b), "2026-01-02T03:04:05.120Z");
        assert!(format_timestamp(&a) < format_timestamp(&b));
    }

    #[test]
    fn test_parse_timestamp_accepts_offsets() {
        let parsed = parse_timestamp("2026-10-18T08:00:00-04:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
