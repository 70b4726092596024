//! Metabolic calculations
//!
//! BMR (Mifflin-St Jeor), TDEE, calorie deficit and projected weekly weight
//! change, plus suggested macro targets for a goal.
//!
//! A BMR of `0.0` means "insufficient data": at least one of age, sex, weight
//! or height is missing. TDEE is `0.0` whenever BMR is. Callers check before
//! displaying.

use serde::{Deserialize, Serialize};

use super::units::round1;

/// kcal in one pound of body fat
pub const KCAL_PER_LB: f64 = 3500.0;

/// Multiplier used when the activity level is unset or unrecognised
pub const DEFAULT_ACTIVITY_MULTIPLIER: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            _ => None,
        }
    }

    /// Constant term of the Mifflin-St Jeor equation
    pub fn bmr_offset(&self) -> f64 {
        match self {
            Sex::Male => 5.0,
            Sex::Female => -161.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Lose,
    Maintain,
    Gain,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Lose => "lose",
            GoalType::Maintain => "maintain",
            GoalType::Gain => "gain",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lose" => Some(GoalType::Lose),
            "maintain" => Some(GoalType::Maintain),
            "gain" => Some(GoalType::Gain),
            _ => None,
        }
    }
}

/// Body profile; every attribute may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
}

impl Profile {
    /// True when age, sex, weight and height are all present
    pub fn is_complete(&self) -> bool {
        self.age.is_some() && self.sex.is_some() && self.weight_kg.is_some() && self.height_cm.is_some()
    }
}

/// Rounded guidance metrics for a calorie target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub bmr: f64,
    pub tdee: f64,
    /// Positive means the target sits below maintenance
    pub deficit: f64,
    /// lbs/week, positive means weight loss
    pub projected_weekly_change: f64,
}

/// Basal metabolic rate, or `0.0` if the profile is incomplete
pub fn compute_bmr(profile: &Profile) -> f64 {
    match (profile.age, profile.sex, profile.weight_kg, profile.height_cm) {
        (Some(age), Some(sex), Some(weight), Some(height)) => {
            10.0 * weight + 6.25 * height - 5.0 * age as f64 + sex.bmr_offset()
        }
        _ => 0.0,
    }
}

/// Total daily energy expenditure, or `0.0` if BMR is
pub fn compute_tdee(profile: &Profile) -> f64 {
    let bmr = compute_bmr(profile);
    if bmr == 0.0 {
        return 0.0;
    }
    let multiplier = profile
        .activity_level
        .map_or(DEFAULT_ACTIVITY_MULTIPLIER, |level| level.multiplier());
    bmr * multiplier
}

/// BMR, TDEE and deficit rounded to whole calories; weekly change to 0.1 lb.
///
/// Each output is derived from the unrounded values, then rounded. With an
/// incomplete profile everything is zero except `deficit`, which becomes
/// `-target_calories`.
pub fn compute_metrics(profile: &Profile, target_calories: i64) -> Metrics {
    let bmr = compute_bmr(profile);
    let tdee = compute_tdee(profile);
    let deficit = tdee - target_calories as f64;
    let weekly = if tdee == 0.0 { 0.0 } else { deficit * 7.0 / KCAL_PER_LB };

    Metrics {
        bmr: bmr.round(),
        tdee: tdee.round(),
        deficit: deficit.round(),
        projected_weekly_change: round1(weekly),
    }
}

/// Suggested daily targets for a goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTargets {
    pub daily_calories: i64,
    pub daily_protein: f64,
    pub daily_carbs: f64,
    pub daily_fat: f64,
}

/// Calorie floor for suggested targets
pub const MIN_SUGGESTED_CALORIES: f64 = 1200.0;

/// Derive targets from the profile: TDEE -500 (lose), TDEE (maintain) or
/// TDEE +300 (gain); protein by body weight, fat at 25% of calories, carbs
/// take the rest. `None` when the profile is too incomplete for a BMR.
pub fn suggest_targets(profile: &Profile, goal: GoalType) -> Option<SuggestedTargets> {
    let tdee = compute_tdee(profile);
    let weight = profile.weight_kg?;
    if tdee == 0.0 {
        return None;
    }

    let calories = match goal {
        GoalType::Lose => tdee - 500.0,
        GoalType::Maintain => tdee,
        GoalType::Gain => tdee + 300.0,
    }
    .max(MIN_SUGGESTED_CALORIES)
    .round();

    let protein_per_kg = match goal {
        GoalType::Lose => 2.0,
        GoalType::Maintain | GoalType::Gain => 1.6,
    };
    let protein = (weight * protein_per_kg).round();
    let fat = (calories * 0.25 / 9.0).round();
    let carbs = ((calories - protein * 4.0 - fat * 9.0) / 4.0).max(0.0).round();

    Some(SuggestedTargets {
        daily_calories: calories as i64,
        daily_protein: protein,
        daily_carbs: carbs,
        daily_fat: fat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male_30() -> Profile {
        Profile {
            age: Some(30),
            sex: Some(Sex::Male),
            weight_kg: Some(80.0),
            height_cm: Some(180.0),
            activity_level: None,
        }
    }

    #[test]
    fn test_bmr_male() {
        // 800 + 1125 - 150 + 5
        assert_eq!(compute_bmr(&male_30()), 1780.0);
    }

    #[test]
    fn test_bmr_female() {
        let profile = Profile { sex: Some(Sex::Female), ..male_30() };
        assert_eq!(compute_bmr(&profile), 1614.0);
    }

    #[test]
    fn test_bmr_missing_field_is_zero() {
        for profile in [
            Profile { age: None, ..male_30() },
            Profile { sex: None, ..male_30() },
            Profile { weight_kg: None, ..male_30() },
            Profile { height_cm: None, ..male_30() },
            Profile::default(),
        ] {
            assert_eq!(compute_bmr(&profile), 0.0);
            assert_eq!(compute_tdee(&profile), 0.0);
        }
    }

    #[test]
    fn test_tdee_sedentary() {
        let profile = Profile { activity_level: Some(ActivityLevel::Sedentary), ..male_30() };
        assert!((compute_tdee(&profile) - 2136.0).abs() < 1e-9);
    }

    #[test]
    fn test_tdee_unset_activity_defaults_to_sedentary() {
        assert!((compute_tdee(&male_30()) - 2136.0).abs() < 1e-9);
        assert_eq!(ActivityLevel::from_str("couch"), None);
    }

    #[test]
    fn test_tdee_very_active() {
        let profile = Profile { activity_level: Some(ActivityLevel::VeryActive), ..male_30() };
        assert!((compute_tdee(&profile) - 3382.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics() {
        let profile = Profile { activity_level: Some(ActivityLevel::Moderate), ..male_30() };
        // tdee = 1780 * 1.55 = 2759
        let m = compute_metrics(&profile, 2259);
        assert_eq!(m.bmr, 1780.0);
        assert_eq!(m.tdee, 2759.0);
        assert_eq!(m.deficit, 500.0);
        // 500 * 7 / 3500
        assert_eq!(m.projected_weekly_change, 1.0);
    }

    #[test]
    fn test_metrics_surplus_is_negative() {
        let m = compute_metrics(&male_30(), 2486);
        assert_eq!(m.deficit, -350.0);
        assert_eq!(m.projected_weekly_change, -0.7);
    }

    #[test]
    fn test_metrics_incomplete_profile() {
        let m = compute_metrics(&Profile::default(), 2000);
        assert_eq!(m.bmr, 0.0);
        assert_eq!(m.tdee, 0.0);
        assert_eq!(m.projected_weekly_change, 0.0);
    }

    #[test]
    fn test_suggest_targets_lose() {
        let t = suggest_targets(&male_30(), GoalType::Lose).unwrap();
        // 2136 - 500
        assert_eq!(t.daily_calories, 1636);
        assert_eq!(t.daily_protein, 160.0);
        assert_eq!(t.daily_fat, 45.0);
        // (1636 - 640 - 405) / 4 = 147.75
        assert_eq!(t.daily_carbs, 148.0);
    }

    #[test]
    fn test_suggest_targets_floor_and_missing() {
        let small = Profile {
            age: Some(80),
            sex: Some(Sex::Female),
            weight_kg: Some(40.0),
            height_cm: Some(145.0),
            activity_level: None,
        };
        assert_eq!(suggest_targets(&small, GoalType::Lose).unwrap().daily_calories, 1200);
        assert!(suggest_targets(&Profile::default(), GoalType::Maintain).is_none());
    }

    #[test]
    fn test_enum_strings_round_trip() {
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ] {
            assert_eq!(ActivityLevel::from_str(level.as_str()), Some(level));
        }
        assert_eq!(Sex::from_str("Female"), Some(Sex::Female));
        assert_eq!(GoalType::from_str("GAIN"), Some(GoalType::Gain));
    }
}
