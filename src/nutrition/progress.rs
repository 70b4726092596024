//! Progress against goals
//!
//! Rounding happens here, at display time: grams to one decimal, calories and
//! percentages to whole numbers.

use serde::{Deserialize, Serialize};

use crate::models::{Macros, UserGoals};
use super::units::round1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroProgress {
    pub consumed: f64,
    pub target: f64,
    /// Negative once the target is exceeded
    pub remaining: f64,
    /// Share of the target consumed; 0 when the target is 0
    pub percent: f64,
}

impl MacroProgress {
    fn new(consumed: f64, target: f64, round: fn(f64) -> f64) -> Self {
        let percent = if target > 0.0 { (consumed / target * 100.0).round() } else { 0.0 };
        Self {
            consumed: round(consumed),
            target: round(target),
            remaining: round(target - consumed),
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub calories: MacroProgress,
    pub protein: MacroProgress,
    pub carbs: MacroProgress,
    pub fat: MacroProgress,
}

impl GoalProgress {
    pub fn compute(totals: &Macros, goals: &UserGoals) -> Self {
        Self {
            calories: MacroProgress::new(totals.calories as f64, goals.daily_calories as f64, f64::round),
            protein: MacroProgress::new(totals.protein, goals.daily_protein, round1),
            carbs: MacroProgress::new(totals.carbs, goals.daily_carbs, round1),
            fat: MacroProgress::new(totals.fat, goals.daily_fat, round1),
        }
    }
}
