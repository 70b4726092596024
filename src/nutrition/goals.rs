//! Goal normalisation
//!
//! Merges a partial goals update into the stored record. Pure: persistence is
//! the caller's job.
//!
//! The two entry paths disagree on the default protein target. The goals
//! wizard defaults to 150 g, a profile-only edit that creates the record
//! implicitly defaults to 50 g. Both are kept as-is; see `GoalDefaults`.

use serde::{Deserialize, Serialize};

use crate::models::UserGoals;
use super::metabolic::{ActivityLevel, GoalType, Sex, SuggestedTargets};
use super::units::round1;

/// Targets used when a record is created without them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalDefaults {
    pub daily_calories: i64,
    pub daily_protein: f64,
    pub daily_carbs: f64,
    pub daily_fat: f64,
}

impl GoalDefaults {
    /// Goals wizard (explicit save)
    pub const WIZARD: GoalDefaults = GoalDefaults {
        daily_calories: 2000,
        daily_protein: 150.0,
        daily_carbs: 250.0,
        daily_fat: 65.0,
    };

    /// Profile edit that creates the record implicitly
    pub const PROFILE_EDIT: GoalDefaults = GoalDefaults {
        daily_calories: 2000,
        daily_protein: 50.0,
        daily_carbs: 250.0,
        daily_fat: 65.0,
    };
}

/// A partial update. Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalsPatch {
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal_type: Option<GoalType>,
    pub daily_calories: Option<i64>,
    pub daily_protein: Option<f64>,
    pub daily_carbs: Option<f64>,
    pub daily_fat: Option<f64>,
}

impl GoalsPatch {
    pub fn is_empty(&self) -> bool {
        *self == GoalsPatch::default()
    }

    /// Patch carrying only suggested targets
    pub fn from_targets(targets: &SuggestedTargets) -> Self {
        Self {
            daily_calories: Some(targets.daily_calories),
            daily_protein: Some(targets.daily_protein),
            daily_carbs: Some(targets.daily_carbs),
            daily_fat: Some(targets.daily_fat),
            ..Default::default()
        }
    }
}

/// Merge `patch` into `existing`, or build a new record for `user_id` from
/// `defaults` plus the patch.
///
/// Weight is rounded to one decimal before it lands in the record. An empty
/// patch returns `existing` unchanged. Passing `None` for `existing` is a full
/// replace.
pub fn upsert_goals(
    user_id: i64,
    existing: Option<&UserGoals>,
    patch: &GoalsPatch,
    defaults: &GoalDefaults,
) -> UserGoals {
    let mut goals = match existing {
        Some(goals) => goals.clone(),
        None => UserGoals {
            user_id,
            age: None,
            sex: None,
            weight_kg: None,
            height_cm: None,
            activity_level: None,
            goal_type: None,
            daily_calories: defaults.daily_calories,
            daily_protein: defaults.daily_protein,
            daily_carbs: defaults.daily_carbs,
            daily_fat: defaults.daily_fat,
        },
    };

    if let Some(age) = patch.age {
        goals.age = Some(age);
    }
    if let Some(sex) = patch.sex {
        goals.sex = Some(sex);
    }
    if let Some(weight) = patch.weight_kg {
        goals.weight_kg = Some(round1(weight));
    }
    if let Some(height) = patch.height_cm {
        goals.height_cm = Some(height);
    }
    if let Some(level) = patch.activity_level {
        goals.activity_level = Some(level);
    }
    if let Some(goal_type) = patch.goal_type {
        goals.goal_type = Some(goal_type);
    }
    if let Some(calories) = patch.daily_calories {
        goals.daily_calories = calories;
    }
    if let Some(protein) = patch.daily_protein {
        goals.daily_protein = protein;
    }
    if let Some(carbs) = patch.daily_carbs {
        goals.daily_carbs = carbs;
    }
    if let Some(fat) = patch.daily_fat {
        goals.daily_fat = fat;
    }

    goals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> UserGoals {
        UserGoals {
            user_id: 7,
            age: Some(41),
            sex: Some(Sex::Female),
            weight_kg: Some(70.0),
            height_cm: Some(165.0),
            activity_level: Some(ActivityLevel::Light),
            goal_type: Some(GoalType::Maintain),
            daily_calories: 2000,
            daily_protein: 150.0,
            daily_carbs: 200.0,
            daily_fat: 65.0,
        }
    }

    #[test]
    fn test_weight_patch_rounds_and_keeps_macros() {
        let patch = GoalsPatch { weight_kg: Some(82.34), ..Default::default() };
        let merged = upsert_goals(7, Some(&existing()), &patch, &GoalDefaults::PROFILE_EDIT);
        assert_eq!(merged.weight_kg, Some(82.3));
        assert_eq!(merged.daily_calories, 2000);
        assert_eq!(merged.daily_protein, 150.0);
        assert_eq!(merged.daily_carbs, 200.0);
        assert_eq!(merged.daily_fat, 65.0);
        assert_eq!(merged.age, Some(41));
        assert_eq!(merged.activity_level, Some(ActivityLevel::Light));
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let patch = GoalsPatch::default();
        assert!(patch.is_empty());
        let merged = upsert_goals(7, Some(&existing()), &patch, &GoalDefaults::WIZARD);
        assert_eq!(merged, existing());
    }

    #[test]
    fn test_unknown_fields_deserialize_to_empty_patch() {
        let patch: GoalsPatch = serde_json::from_str(r#"{"favourite_colour": "blue"}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_create_uses_path_defaults() {
        let patch = GoalsPatch { age: Some(25), ..Default::default() };

        let from_profile = upsert_goals(3, None, &patch, &GoalDefaults::PROFILE_EDIT);
        assert_eq!(from_profile.user_id, 3);
        assert_eq!(from_profile.age, Some(25));
        assert_eq!(from_profile.daily_calories, 2000);
        assert_eq!(from_profile.daily_protein, 50.0);
        assert_eq!(from_profile.daily_carbs, 250.0);
        assert_eq!(from_profile.daily_fat, 65.0);

        let from_wizard = upsert_goals(3, None, &patch, &GoalDefaults::WIZARD);
        assert_eq!(from_wizard.daily_protein, 150.0);
    }

    #[test]
    fn test_create_prefers_patch_targets() {
        let patch = GoalsPatch {
            daily_calories: Some(1750),
            daily_fat: Some(55.5),
            ..Default::default()
        };
        let goals = upsert_goals(3, None, &patch, &GoalDefaults::WIZARD);
        assert_eq!(goals.daily_calories, 1750);
        assert_eq!(goals.daily_fat, 55.5);
        assert_eq!(goals.daily_carbs, 250.0);
    }

    #[test]
    fn test_from_targets() {
        let patch = GoalsPatch::from_targets(&SuggestedTargets {
            daily_calories: 1636,
            daily_protein: 160.0,
            daily_carbs: 148.0,
            daily_fat: 45.0,
        });
        let merged = upsert_goals(7, Some(&existing()), &patch, &GoalDefaults::WIZARD);
        assert_eq!(merged.daily_calories, 1636);
        assert_eq!(merged.weight_kg, Some(70.0));
    }
}
