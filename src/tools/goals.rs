//! Goals Tools
//!
//! Onboarding wizard saves, profile edits, metabolic guidance and unit
//! conversion.

use serde::Serialize;

use crate::db::Database;
use crate::models::UserGoals;
use crate::nutrition::goals::{upsert_goals, GoalDefaults, GoalsPatch};
use crate::nutrition::metabolic::{compute_metrics, suggest_targets, GoalType, Metrics, SuggestedTargets};
use crate::nutrition::units::{
    cm_to_feet_inches, feet_inches_to_cm, kg_to_lbs, lbs_to_kg, round1, Conversion, FeetInches,
};

/// Goals plus the derived views the presentation layer needs
#[derive(Debug, Serialize)]
pub struct GoalsView {
    pub goals: UserGoals,
    pub weight_lbs: Option<f64>,
    pub height_ft_in: Option<FeetInches>,
    pub metrics: Option<Metrics>,
}

impl GoalsView {
    fn new(goals: UserGoals) -> Self {
        let profile = goals.profile();
        let metrics = profile
            .is_complete()
            .then(|| compute_metrics(&profile, goals.daily_calories));
        Self {
            weight_lbs: goals.weight_kg.map(|kg| round1(kg_to_lbs(kg))),
            height_ft_in: goals.height_cm.map(cm_to_feet_inches),
            metrics,
            goals,
        }
    }
}

/// Response for get_metrics
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub target_calories: i64,
    /// False when age, sex, weight or height is missing; metrics are then zero
    pub profile_complete: bool,
    pub metrics: Metrics,
}

/// Response for suggest_goals
#[derive(Debug, Serialize)]
pub struct SuggestGoalsResponse {
    pub goal_type: GoalType,
    pub suggested: Option<SuggestedTargets>,
    /// Set when the suggestion was saved
    pub applied: Option<UserGoals>,
}

/// Response for convert_units
#[derive(Debug, Serialize)]
pub struct ConvertUnitsResponse {
    pub conversion: Conversion,
    pub value: f64,
    pub result: Option<f64>,
    pub feet_inches: Option<FeetInches>,
}

fn load_goals(db: &Database, user_id: i64) -> Result<Option<UserGoals>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserGoals::get_for_user(&conn, user_id).map_err(|e| format!("Failed to get goals: {}", e))
}

fn store_goals(db: &Database, goals: &UserGoals) -> Result<UserGoals, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    UserGoals::save(&conn, goals).map_err(|e| format!("Failed to save goals: {}", e))
}

fn validate_patch(patch: &GoalsPatch) -> Result<(), String> {
    if patch.age == Some(0) {
        return Err("Age must be positive".to_string());
    }
    for (field, value) in [
        ("weight_kg", patch.weight_kg),
        ("height_cm", patch.height_cm),
    ] {
        if matches!(value, Some(v) if !v.is_finite() || v <= 0.0) {
            return Err(format!("{} must be positive", field));
        }
    }
    if matches!(patch.daily_calories, Some(c) if c < 0) {
        return Err("daily_calories must not be negative".to_string());
    }
    for (field, value) in [
        ("daily_protein", patch.daily_protein),
        ("daily_carbs", patch.daily_carbs),
        ("daily_fat", patch.daily_fat),
    ] {
        if matches!(value, Some(v) if !v.is_finite() || v < 0.0) {
            return Err(format!("{} must not be negative", field));
        }
    }
    Ok(())
}

/// Get the user's goals, or `None` if onboarding is incomplete
pub fn get_goals(db: &Database, user_id: i64) -> Result<Option<GoalsView>, String> {
    Ok(load_goals(db, user_id)?.map(GoalsView::new))
}

/// Wizard save: replaces the whole record, missing targets fall back to the
/// wizard defaults
pub fn save_goals(db: &Database, user_id: i64, patch: GoalsPatch) -> Result<GoalsView, String> {
    validate_patch(&patch)?;
    let goals = upsert_goals(user_id, None, &patch, &GoalDefaults::WIZARD);
    let saved = store_goals(db, &goals)?;
    tracing::info!(user_id, daily_calories = saved.daily_calories, "saved goals");
    Ok(GoalsView::new(saved))
}

/// Profile edit: merges profile fields only, creating the record with the
/// profile-edit defaults if needed
pub fn update_profile(db: &Database, user_id: i64, patch: GoalsPatch) -> Result<GoalsView, String> {
    let profile_only = GoalsPatch {
        daily_calories: None,
        daily_protein: None,
        daily_carbs: None,
        daily_fat: None,
        ..patch
    };
    validate_patch(&profile_only)?;

    let existing = load_goals(db, user_id)?;
    if profile_only.is_empty() {
        if let Some(goals) = existing {
            return Ok(GoalsView::new(goals));
        }
    }

    let merged = upsert_goals(user_id, existing.as_ref(), &profile_only, &GoalDefaults::PROFILE_EDIT);
    if existing.as_ref() == Some(&merged) {
        return Ok(GoalsView::new(merged));
    }

    let saved = store_goals(db, &merged)?;
    tracing::info!(user_id, created = existing.is_none(), "updated profile");
    Ok(GoalsView::new(saved))
}

/// BMR/TDEE/deficit for a target (defaults to the saved daily calories)
pub fn get_metrics(
    db: &Database,
    user_id: i64,
    target_calories: Option<i64>,
) -> Result<Option<MetricsResponse>, String> {
    let Some(goals) = load_goals(db, user_id)? else {
        return Ok(None);
    };
    let profile = goals.profile();
    let target = target_calories.unwrap_or(goals.daily_calories);

    Ok(Some(MetricsResponse {
        target_calories: target,
        profile_complete: profile.is_complete(),
        metrics: compute_metrics(&profile, target),
    }))
}

/// Suggest targets from the profile; optionally save them
pub fn suggest_goals(
    db: &Database,
    user_id: i64,
    goal_type: Option<GoalType>,
    apply: bool,
) -> Result<Option<SuggestGoalsResponse>, String> {
    let Some(goals) = load_goals(db, user_id)? else {
        return Ok(None);
    };
    let goal_type = goal_type.or(goals.goal_type).unwrap_or(GoalType::Maintain);
    let suggested = suggest_targets(&goals.profile(), goal_type);

    let applied = match (apply, suggested.as_ref()) {
        (true, Some(targets)) => {
            let mut patch = GoalsPatch::from_targets(targets);
            patch.goal_type = Some(goal_type);
            let merged = upsert_goals(user_id, Some(&goals), &patch, &GoalDefaults::WIZARD);
            let saved = store_goals(db, &merged)?;
            tracing::info!(user_id, goal_type = goal_type.as_str(), "applied suggested goals");
            Some(saved)
        }
        _ => None,
    };

    Ok(Some(SuggestGoalsResponse { goal_type, suggested, applied }))
}

/// Convert between metric and imperial body units. `inches` is only read for
/// `feet_inches_to_cm`, where `value` is the feet.
pub fn convert_units(conversion: &str, value: f64, inches: Option<f64>) -> Result<ConvertUnitsResponse, String> {
    let conversion = Conversion::from_str(conversion).ok_or_else(|| {
        format!(
            "Unknown conversion '{}', expected kg_to_lbs, lbs_to_kg, cm_to_feet_inches or feet_inches_to_cm",
            conversion
        )
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err("Value must be a non-negative number".to_string());
    }

    let (result, feet_inches) = match conversion {
        Conversion::KgToLbs => (Some(kg_to_lbs(value)), None),
        Conversion::LbsToKg => (Some(lbs_to_kg(value)), None),
        Conversion::CmToFeetInches => (None, Some(cm_to_feet_inches(value))),
        Conversion::FeetInchesToCm => (Some(feet_inches_to_cm(value, inches.unwrap_or(0.0))), None),
    };

    Ok(ConvertUnitsResponse { conversion, value, result, feet_inches })
}
