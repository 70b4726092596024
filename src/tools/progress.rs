//! Progress Tools
//!
//! Daily and range totals, streaks, and the dashboard view. Every call reads a
//! fresh snapshot of entries, so totals always reflect the latest edits.

use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::db::Database;
use crate::models::{Macros, NutritionEntry, UserGoals};
use crate::nutrition::aggregate::{
    aggregate, average_daily, daily_series, day_bounds, day_bucket, span_bounds,
    totals_over_range, week_bounds, DailyTotals,
};
use crate::nutrition::progress::GoalProgress;
use crate::nutrition::streak::compute_streak_capped;
use super::entries::load_entries;

/// Longest span a single series request may cover
pub const MAX_SERIES_DAYS: i64 = 366;

/// Response for get_range_totals
#[derive(Debug, Serialize)]
pub struct RangeTotalsResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub totals: Macros,
    pub days: i64,
    pub days_logged: usize,
    pub daily_average: Macros,
}

/// Response for get_streak
#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub today: NaiveDate,
    pub streak: u32,
    pub logged_today: bool,
}

/// This week's numbers for the dashboard
#[derive(Debug, Serialize)]
pub struct WeekSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub totals: Macros,
    pub daily_average: Macros,
    pub days: Vec<DailyTotals>,
}

/// Everything the dashboard shows for one day
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub today: Macros,
    pub entries_today: Vec<NutritionEntry>,
    /// Absent until onboarding has saved goals
    pub goals: Option<UserGoals>,
    pub progress: Option<GoalProgress>,
    pub streak: u32,
    pub week: WeekSummary,
}

fn check_span(start: NaiveDate, end: NaiveDate) -> Result<i64, String> {
    if end < start {
        return Err(format!("end_date {} is before start_date {}", end, start));
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_SERIES_DAYS {
        return Err(format!("Range covers {} days, the limit is {}", days, MAX_SERIES_DAYS));
    }
    Ok(days)
}

fn load_span<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Result<Vec<NutritionEntry>, String> {
    let (from, to) = span_bounds(start, end, tz);
    load_entries(db, user_id, Some(from), Some(to))
}

/// Totals for one local day (zero if nothing was logged)
pub fn get_daily_totals<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    date: NaiveDate,
    tz: &Tz,
) -> Result<DailyTotals, String> {
    let entries = load_span(db, user_id, date, date, tz)?;
    let totals = aggregate(&entries, tz)
        .remove(&date)
        .unwrap_or_else(|| DailyTotals::empty(date));
    Ok(DailyTotals { date, totals: totals.totals.rounded() })
}

/// Totals and daily average across local days `start..=end`
pub fn get_range_totals<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Result<RangeTotalsResponse, String> {
    let days = check_span(start, end)?;
    let entries = load_span(db, user_id, start, end, tz)?;

    let (from, to) = span_bounds(start, end, tz);
    let totals = totals_over_range(&entries, from, to);
    let series = daily_series(&entries, tz, start, end);
    let days_logged = aggregate(&entries, tz).len();

    Ok(RangeTotalsResponse {
        start_date: start,
        end_date: end,
        totals: totals.rounded(),
        days,
        days_logged,
        daily_average: average_daily(&series).rounded(),
    })
}

/// One zero-filled `DailyTotals` per day in `start..=end`
pub fn get_daily_series<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Result<Vec<DailyTotals>, String> {
    check_span(start, end)?;
    let entries = load_span(db, user_id, start, end, tz)?;
    Ok(daily_series(&entries, tz, start, end)
        .into_iter()
        .map(|d| DailyTotals { date: d.date, totals: d.totals.rounded() })
        .collect())
}

/// Only the window a capped streak can reach is loaded
fn load_streak_window<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    tz: &Tz,
    max_days: u32,
) -> Result<Vec<NutritionEntry>, String> {
    let first = today
        .checked_sub_signed(Duration::days(i64::from(max_days) + 1))
        .unwrap_or(NaiveDate::MIN);
    let (from, _) = day_bounds(first, tz);
    let (_, to) = day_bounds(today, tz);
    load_entries(db, user_id, Some(from), Some(to))
}

pub fn get_streak<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    tz: &Tz,
    max_days: u32,
) -> Result<StreakResponse, String> {
    let entries = load_streak_window(db, user_id, today, tz, max_days)?;
    let logged_today = entries.iter().any(|e| day_bucket(&e.consumed_at, tz) == today);

    Ok(StreakResponse {
        today,
        streak: compute_streak_capped(&entries, today, tz, max_days),
        logged_today,
    })
}

/// Today's totals and goal progress, the streak, and this week's summary
pub fn get_dashboard<Tz: TimeZone>(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    tz: &Tz,
    max_days: u32,
) -> Result<Dashboard, String> {
    let goals = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        UserGoals::get_for_user(&conn, user_id)
            .map_err(|e| format!("Failed to get goals: {}", e))?
    };

    // The streak window always covers the current week
    let window_days = max_days.max(7);
    let entries = load_streak_window(db, user_id, today, tz, window_days)?;
    let streak = compute_streak_capped(&entries, today, tz, max_days);

    let (today_start, today_end) = day_bounds(today, tz);
    let today_totals = totals_over_range(&entries, today_start, today_end);
    let entries_today: Vec<NutritionEntry> = entries
        .iter()
        .filter(|e| e.consumed_at >= today_start && e.consumed_at <= today_end)
        .cloned()
        .collect();

    let (week_start, week_end) = week_bounds(today);
    let (from, to) = span_bounds(week_start, week_end, tz);
    let week_days = daily_series(&entries, tz, week_start, week_end);
    let week = WeekSummary {
        start_date: week_start,
        end_date: week_end,
        totals: totals_over_range(&entries, from, to).rounded(),
        daily_average: average_daily(&week_days).rounded(),
        days: week_days
            .into_iter()
            .map(|d| DailyTotals { date: d.date, totals: d.totals.rounded() })
            .collect(),
    };

    let progress = goals.as_ref().map(|g| GoalProgress::compute(&today_totals, g));

    Ok(Dashboard {
        date: today,
        today: today_totals.rounded(),
        entries_today,
        goals,
        progress,
        streak,
        week,
    })
}
