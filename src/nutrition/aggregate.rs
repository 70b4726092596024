//! Daily and range aggregation
//!
//! Entries are bucketed by the local calendar day of `consumed_at`. Bucket keys
//! are `NaiveDate` values compared directly, never formatted strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Macros, NutritionEntry};

/// Totals for one day bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Macros,
}

impl DailyTotals {
    pub fn empty(date: NaiveDate) -> Self {
        Self { date, totals: Macros::zero() }
    }
}

/// The local calendar day an instant falls on
pub fn day_bucket<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// First instant of a local day, in UTC.
///
/// When local midnight does not exist (a DST gap) the earliest valid local
/// time is used; if the zone cannot resolve it at all, midnight UTC.
pub fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let resolved = tz.from_local_datetime(&midnight).earliest().or_else(|| {
        (1..=3).find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h))).earliest()
        })
    });
    match resolved {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// Inclusive `[start, end]` UTC instants covering a local day.
///
/// The last representable day ends at `DateTime::<Utc>::MAX_UTC`.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(date, tz);
    let end = date
        .succ_opt()
        .map(|d| day_start(d, tz))
        .or_else(|| start.checked_add_signed(Duration::days(1)))
        .and_then(|next| next.checked_sub_signed(Duration::nanoseconds(1)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// Inclusive UTC bounds spanning local days `first..=last`
pub fn span_bounds<Tz: TimeZone>(
    first: NaiveDate,
    last: NaiveDate,
    tz: &Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (day_bounds(first, tz).0, day_bounds(last, tz).1)
}

/// Monday and Sunday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = date.week(Weekday::Mon);
    (week.first_day(), week.last_day())
}

/// Group entries into day buckets and sum each bucket.
///
/// Days without entries are absent from the result.
pub fn aggregate<Tz: TimeZone>(entries: &[NutritionEntry], tz: &Tz) -> BTreeMap<NaiveDate, DailyTotals> {
    let mut days: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for entry in entries {
        let date = day_bucket(&entry.consumed_at, tz);
        days.entry(date)
            .or_insert_with(|| DailyTotals::empty(date))
            .totals += entry.macros();
    }
    days
}

/// Sum every entry consumed within `[start, end]`, ignoring day boundaries
pub fn totals_over_range(entries: &[NutritionEntry], start: DateTime<Utc>, end: DateTime<Utc>) -> Macros {
    entries
        .iter()
        .filter(|e| e.consumed_at >= start && e.consumed_at <= end)
        .map(NutritionEntry::macros)
        .sum()
}

/// One `DailyTotals` per day in `first..=last`, zero for days without entries
pub fn daily_series<Tz: TimeZone>(
    entries: &[NutritionEntry],
    tz: &Tz,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<DailyTotals> {
    let buckets = aggregate(entries, tz);
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| buckets.get(&d).copied().unwrap_or_else(|| DailyTotals::empty(d)))
        .collect()
}

/// Mean per day across a series, empty days included
pub fn average_daily(series: &[DailyTotals]) -> Macros {
    let total: Macros = series.iter().map(|d| d.totals).sum();
    total.average_over(series.len())
}

/// Round fractional calories from an upstream estimate before storage
pub fn whole_calories(calories: f64) -> i64 {
    if calories.is_finite() {
        calories.max(0.0).round() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn entry(id: i64, at: DateTime<Utc>, calories: i64, protein: f64) -> NutritionEntry {
        NutritionEntry {
            id,
            user_id: 1,
            name: format!("meal {}", id),
            calories,
            protein,
            carbs: 10.5,
            fat: 2.25,
            fiber: 0.0,
            description: None,
            image_url: None,
            consumed_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aggregate_partitions_every_entry_once() {
        let entries = vec![
            entry(1, utc(2026, 10, 17, 8, 0), 300, 20.1),
            entry(2, utc(2026, 10, 17, 19, 0), 700, 40.2),
            entry(3, utc(2026, 10, 18, 12, 0), 550, 30.3),
        ];
        let days = aggregate(&entries, &Utc);
        assert_eq!(days.len(), 2);

        let d17 = days[&date(2026, 10, 17)];
        assert_eq!(d17.totals.calories, 1000);
        assert!((d17.totals.protein - 60.3).abs() < 1e-9);
        assert!((d17.totals.carbs - 21.0).abs() < 1e-9);
        assert!((d17.totals.fat - 4.5).abs() < 1e-9);

        let sum: Macros = days.values().map(|d| d.totals).sum();
        let direct: Macros = entries.iter().map(NutritionEntry::macros).sum();
        assert_eq!(sum.calories, direct.calories);
        assert!((sum.protein - direct.protein).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_uses_local_day() {
        // 02:30 UTC on the 18th is still the 17th in New York (UTC-4)
        let ny = FixedOffset::west_opt(4 * 3600).unwrap();
        let entries = vec![entry(1, utc(2026, 10, 18, 2, 30), 400, 10.0)];
        let days = aggregate(&entries, &ny);
        assert!(days.contains_key(&date(2026, 10, 17)));
        assert!(!days.contains_key(&date(2026, 10, 18)));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[], &Utc).is_empty());
        assert_eq!(totals_over_range(&[], utc(2026, 1, 1, 0, 0), utc(2026, 12, 31, 0, 0)), Macros::zero());
    }

    #[test]
    fn test_totals_over_range_inclusive_and_monotonic() {
        let entries = vec![
            entry(1, utc(2026, 10, 16, 8, 0), 100, 1.0),
            entry(2, utc(2026, 10, 17, 8, 0), 200, 2.0),
            entry(3, utc(2026, 10, 18, 8, 0), 400, 4.0),
        ];
        let narrow = totals_over_range(&entries, utc(2026, 10, 17, 8, 0), utc(2026, 10, 17, 8, 0));
        assert_eq!(narrow.calories, 200);

        let wide = totals_over_range(&entries, utc(2026, 10, 16, 0, 0), utc(2026, 10, 18, 23, 0));
        assert_eq!(wide.calories, 700);
        assert!(wide.calories >= narrow.calories);
        assert!(wide.protein >= narrow.protein);
    }

    #[test]
    fn test_day_bounds() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, end) = day_bounds(date(2026, 10, 18), &tz);
        assert_eq!(start, utc(2026, 10, 17, 22, 0));
        assert_eq!(end, utc(2026, 10, 18, 22, 0) - Duration::nanoseconds(1));
        assert_eq!(day_bucket(&start, &tz), date(2026, 10, 18));
        assert_eq!(day_bucket(&end, &tz), date(2026, 10, 18));
    }

    #[test]
    fn test_day_bounds_last_representable_day() {
        let (start, end) = day_bounds(NaiveDate::MAX, &Utc);
        assert_eq!(start.date_naive(), NaiveDate::MAX);
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
        assert!(start < end);
    }

    #[test]
    fn test_week_bounds() {
        // 2026-10-18 is a Sunday
        assert_eq!(week_bounds(date(2026, 10, 18)), (date(2026, 10, 12), date(2026, 10, 18)));
        assert_eq!(week_bounds(date(2026, 10, 12)), (date(2026, 10, 12), date(2026, 10, 18)));
    }

    #[test]
    fn test_daily_series_zero_fills() {
        let entries = vec![
            entry(1, utc(2026, 10, 16, 8, 0), 100, 1.0),
            entry(2, utc(2026, 10, 18, 8, 0), 400, 4.0),
        ];
        let series = daily_series(&entries, &Utc, date(2026, 10, 15), date(2026, 10, 18));
        let calories: Vec<i64> = series.iter().map(|d| d.totals.calories).collect();
        assert_eq!(calories, vec![0, 100, 0, 400]);
        assert_eq!(series[0].date, date(2026, 10, 15));

        let avg = average_daily(&series);
        assert_eq!(avg.calories, 125);
        assert!((avg.protein - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_whole_calories() {
        assert_eq!(whole_calories(412.6), 413);
        assert_eq!(whole_calories(-3.0), 0);
        assert_eq!(whole_calories(f64::NAN), 0);
    }
}
