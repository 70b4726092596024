//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::PathBuf;

use chrono::FixedOffset;

use crate::nutrition::streak::{DEFAULT_STREAK_CAP_DAYS, MAX_STREAK_CAP_DAYS};

pub const DATABASE_PATH_VAR: &str = "MACROTRACK_DATABASE_PATH";
pub const USER_VAR: &str = "MACROTRACK_USER";
pub const STREAK_CAP_VAR: &str = "MACROTRACK_STREAK_CAP_DAYS";
pub const UTC_OFFSET_VAR: &str = "MACROTRACK_UTC_OFFSET_MINUTES";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// Account the stdio server acts on behalf of
    pub user: String,
    pub streak_cap_days: u32,
    /// Fixed offset for day buckets; `None` means the host's local offset
    pub utc_offset: Option<FixedOffset>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var(DATABASE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
            user: std::env::var(USER_VAR)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "default".to_string()),
            streak_cap_days: std::env::var(STREAK_CAP_VAR)
                .ok()
                .and_then(|v| parse_streak_cap(&v))
                .unwrap_or(DEFAULT_STREAK_CAP_DAYS),
            utc_offset: std::env::var(UTC_OFFSET_VAR)
                .ok()
                .and_then(|v| parse_offset_minutes(&v)),
        }
    }
}

/// Streak cap clamped to `1..=MAX_STREAK_CAP_DAYS`
fn parse_streak_cap(raw: &str) -> Option<u32> {
    let requested: u64 = raw.trim().parse().ok()?;
    let clamped = requested.clamp(1, u64::from(MAX_STREAK_CAP_DAYS));
    if clamped != requested {
        tracing::warn!(requested, clamped, "{} out of range, clamping", STREAK_CAP_VAR);
    }
    u32::try_from(clamped).ok()
}

fn parse_offset_minutes(raw: &str) -> Option<FixedOffset> {
    let minutes: i32 = raw.trim().parse().ok()?;
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// `<project>/data/macrotrack.db`, resolved next to the executable
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("macrotrack.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset_minutes() {
        assert_eq!(parse_offset_minutes("-300"), FixedOffset::west_opt(5 * 3600));
        assert_eq!(parse_offset_minutes(" 60 "), FixedOffset::east_opt(3600));
        assert_eq!(parse_offset_minutes("abc"), None);
        // beyond +/- 24h is rejected by chrono
        assert_eq!(parse_offset_minutes("1500"), None);
    }

    #[test]
    fn test_parse_streak_cap_clamps() {
        assert_eq!(parse_streak_cap("30"), Some(30));
        assert_eq!(parse_streak_cap("0"), Some(1));
        assert_eq!(parse_streak_cap("4294967295"), Some(MAX_STREAK_CAP_DAYS));
        assert_eq!(parse_streak_cap("99999999999999"), Some(MAX_STREAK_CAP_DAYS));
        assert_eq!(parse_streak_cap("-5"), None);
        assert_eq!(parse_streak_cap("many"), None);
    }

    #[test]
    fn test_default_database_path_file_name() {
        let path = default_database_path();
        assert!(path.ends_with("data/macrotrack.db"));
    }
}
