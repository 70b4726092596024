//! Nutrition calculation module
//!
//! Pure functions over caller-supplied snapshots: daily aggregation, streaks,
//! metabolic metrics, goal merging and unit conversions. Nothing in here does
//! I/O or holds state, so every function is safe to call concurrently.

pub mod aggregate;
pub mod estimate;
pub mod goals;
pub mod metabolic;
pub mod progress;
pub mod streak;
pub mod units;

pub use aggregate::{
    aggregate, average_daily, daily_series, day_bounds, day_bucket, span_bounds,
    totals_over_range, week_bounds, DailyTotals,
};
pub use estimate::{parse_provider_reply, MealEstimate, ProviderError};
pub use goals::{upsert_goals, GoalDefaults, GoalsPatch};
pub use metabolic::{
    compute_bmr, compute_metrics, compute_tdee, suggest_targets, ActivityLevel, GoalType,
    Metrics, Profile, Sex, SuggestedTargets,
};
pub use progress::GoalProgress;
pub use streak::{compute_streak, compute_streak_capped, DEFAULT_STREAK_CAP_DAYS};
pub use units::{cm_to_feet_inches, kg_to_lbs, lbs_to_kg, FeetInches};
