//! Macro Tracker Status Tool
//!
//! Runtime status of the service plus the usage guide handed to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# Macro Tracker Usage

Macro Tracker logs meals with their calories and macronutrients, rolls them up
into daily totals, tracks a logging streak, and compares intake with the
user's goals.

## Logging meals

- `log_entry` takes a name, whole calories, and protein/carbs/fat (and
  optionally fiber) in grams. `consumed_at` defaults to now.
- `log_scanned_meal` takes the raw HTTP status and body returned by a vision
  model asked to estimate a meal photo. A failed or malformed reply is reported
  back as `{"status": "failed", "error": ...}` and no meal is recorded.
- `update_entry` changes only the fields given. An empty `description` or
  `image_url` clears it.
- Timestamps are RFC 3339 (`2026-10-18T12:30:00Z`) or a local date-time
  (`2026-10-18T12:30`), which is read in the server's time zone.

## Days

A day runs from local midnight to local midnight. Ranges are inclusive on both
ends and given as `YYYY-MM-DD`.

## Streaks

The streak counts consecutive days with at least one entry, ending today. If
nothing has been logged yet today, the streak is still alive and counts from
yesterday.

## Goals

- `save_goals` is the onboarding wizard: it replaces the whole goals record.
  Targets left out fall back to 2000 kcal, 150 g protein, 250 g carbs, 65 g fat.
- `update_profile` edits age, sex, weight, height, activity level or goal
  type only. If no record exists yet it is created with 50 g protein.
- `get_metrics` returns BMR, TDEE and the deficit for a calorie target. A BMR
  of 0 means the profile is missing age, sex, weight or height.

Weight is stored in kg and height in cm; use `convert_units` for lbs and ft/in.

## Deleting data

`delete_account` with `confirm=true` removes every meal and the goals record.
The server then continues with a fresh, empty account under the same name.

## Quick Reference

| Task | Tool |
|------|------|
| Log a meal | `log_entry` |
| Log an AI-estimated meal | `log_scanned_meal` |
| View / edit / delete a meal | `get_entry`, `update_entry`, `delete_entry` |
| List meals | `list_entries` |
| Today's totals | `get_daily_totals` |
| Totals and averages for a range | `get_range_totals` |
| Per-day totals for charts | `get_daily_series` |
| Logging streak | `get_streak` |
| Everything for the home screen | `get_dashboard` |
| Goals and profile | `get_goals`, `save_goals`, `update_profile` |
| BMR / TDEE / deficit | `get_metrics` |
| Suggested targets | `suggest_goals` |
| Unit conversion | `convert_units` |
| Delete all data | `delete_account` |
"#;

/// Runtime status of the Macro Tracker service
#[derive(Debug, Clone, Serialize)]
pub struct MacroTrackStatus {
    #[serde(flatten)]
    pub build: BuildInfo,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Account and day boundaries the server works with
    pub user: String,
    pub utc_offset: String,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, user: &str, utc_offset: &str) -> MacroTrackStatus {
        // In-memory and not-yet-created databases have no size
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MacroTrackStatus {
            build: BuildInfo::current(),
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            user: user.to_string(),
            utc_offset: utc_offset.to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
