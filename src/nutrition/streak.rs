//! Logging streak
//!
//! The streak counts consecutive active days (days with at least one entry)
//! walking backwards from today. An empty today does not break the streak
//! yet: the walk then starts from yesterday. Two missed days in a row do.

use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone};

use crate::models::NutritionEntry;
use super::aggregate::day_bucket;

/// Upper bound on the backward walk. A safety limit, not a product rule:
/// a user active every day for longer still reports this many days.
pub const DEFAULT_STREAK_CAP_DAYS: u32 = 365;

/// Largest cap the config accepts (about a century)
pub const MAX_STREAK_CAP_DAYS: u32 = 36_500;

/// Distinct local days that have at least one entry
pub fn active_days<Tz: TimeZone>(entries: &[NutritionEntry], tz: &Tz) -> BTreeSet<NaiveDate> {
    entries.iter().map(|e| day_bucket(&e.consumed_at, tz)).collect()
}

/// Streak ending at `today` (or yesterday), capped at `DEFAULT_STREAK_CAP_DAYS`
pub fn compute_streak<Tz: TimeZone>(entries: &[NutritionEntry], today: NaiveDate, tz: &Tz) -> u32 {
    compute_streak_capped(entries, today, tz, DEFAULT_STREAK_CAP_DAYS)
}

pub fn compute_streak_capped<Tz: TimeZone>(
    entries: &[NutritionEntry],
    today: NaiveDate,
    tz: &Tz,
    max_days: u32,
) -> u32 {
    streak_from_days(&active_days(entries, tz), today, max_days)
}

/// Walk backwards over `days` from `today`, or from yesterday when today is empty
pub fn streak_from_days(days: &BTreeSet<NaiveDate>, today: NaiveDate, max_days: u32) -> u32 {
    let start = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut day = Some(start);
    while let Some(d) = day {
        if streak >= max_days || !days.contains(&d) {
            break;
        }
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn entry_on(day: NaiveDate) -> NutritionEntry {
        let at: DateTime<Utc> = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
        NutritionEntry {
            id: 0,
            user_id: 1,
            name: "meal".to_string(),
            calories: 500,
            protein: 20.0,
            carbs: 50.0,
            fat: 15.0,
            fiber: 0.0,
            description: None,
            image_url: None,
            consumed_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_streak(&[], today(), &Utc), 0);
    }

    #[test]
    fn test_single_entry_today() {
        assert_eq!(compute_streak(&[entry_on(today())], today(), &Utc), 1);
    }

    #[test]
    fn test_three_consecutive_days() {
        let entries: Vec<_> = (0..3).map(|n| entry_on(days_ago(n))).collect();
        assert_eq!(compute_streak(&entries, today(), &Utc), 3);
    }

    #[test]
    fn test_today_not_logged_counts_from_yesterday() {
        let entries = vec![entry_on(days_ago(1)), entry_on(days_ago(2)), entry_on(days_ago(4))];
        assert_eq!(compute_streak(&entries, today(), &Utc), 2);
    }

    #[test]
    fn test_two_missed_days_break_streak() {
        assert_eq!(compute_streak(&[entry_on(days_ago(2))], today(), &Utc), 0);
    }

    #[test]
    fn test_multiple_entries_same_day_count_once() {
        let entries = vec![entry_on(today()), entry_on(today()), entry_on(days_ago(1))];
        assert_eq!(compute_streak(&entries, today(), &Utc), 2);
    }

    #[test]
    fn test_future_entries_ignored() {
        let entries = vec![entry_on(today() + Duration::days(1)), entry_on(today())];
        assert_eq!(compute_streak(&entries, today(), &Utc), 1);
    }

    #[test]
    fn test_cap() {
        let entries: Vec<_> = (0..400).map(|n| entry_on(days_ago(n))).collect();
        assert_eq!(compute_streak(&entries, today(), &Utc), 365);
        assert_eq!(compute_streak_capped(&entries, today(), &Utc, 30), 30);
        assert_eq!(compute_streak_capped(&entries, today(), &Utc, 1000), 400);
    }

    #[test]
    fn test_streak_respects_local_day() {
        // Noon UTC yesterday is 01:00 today at UTC+13
        let tz = FixedOffset::east_opt(13 * 3600).unwrap();
        let entries = vec![entry_on(days_ago(1))];
        assert_eq!(active_days(&entries, &tz).into_iter().collect::<Vec<_>>(), vec![today()]);
        assert_eq!(compute_streak(&entries, today(), &tz), 1);
    }
}
