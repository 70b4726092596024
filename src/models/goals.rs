//! User Goals model
//!
//! At most one record per user. Macro targets are always present; profile
//! attributes may be partially filled.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{format_timestamp, DbResult};
use crate::nutrition::metabolic::{ActivityLevel, GoalType, Profile, Sex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGoals {
    pub user_id: i64,

    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal_type: Option<GoalType>,

    pub daily_calories: i64,
    pub daily_protein: f64,
    pub daily_carbs: f64,
    pub daily_fat: f64,
}

impl UserGoals {
    /// The body profile used by the metabolic calculator
    pub fn profile(&self) -> Profile {
        Profile {
            age: self.age,
            sex: self.sex,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            activity_level: self.activity_level,
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let user_id: i64 = row.get("user_id")?;
        let sex: Option<String> = row.get("sex")?;
        let activity: Option<String> = row.get("activity_level")?;
        let goal_type: Option<String> = row.get("goal_type")?;

        let activity_level = activity.as_deref().and_then(|raw| {
            let parsed = ActivityLevel::from_str(raw);
            if parsed.is_none() {
                tracing::warn!(user_id, activity_level = raw, "unrecognised activity level, using sedentary multiplier");
            }
            parsed
        });

        Ok(Self {
            user_id,
            age: row.get("age")?,
            sex: sex.as_deref().and_then(Sex::from_str),
            weight_kg: row.get("weight_kg")?,
            height_cm: row.get("height_cm")?,
            activity_level,
            goal_type: goal_type.as_deref().and_then(GoalType::from_str),
            daily_calories: row.get("daily_calories")?,
            daily_protein: row.get("daily_protein")?,
            daily_carbs: row.get("daily_carbs")?,
            daily_fat: row.get("daily_fat")?,
        })
    }

    /// Get the goals record for a user, if onboarding has produced one
    pub fn get_for_user(conn: &Connection, user_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_goals WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(goals) => Ok(Some(goals)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or fully replace the user's record
    pub fn save(conn: &Connection, goals: &UserGoals) -> DbResult<Self> {
        let now = format_timestamp(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO user_goals (
                user_id, age, sex, weight_kg, height_cm, activity_level, goal_type,
                daily_calories, daily_protein, daily_carbs, daily_fat,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT(user_id) DO UPDATE SET
                age = excluded.age,
                sex = excluded.sex,
                weight_kg = excluded.weight_kg,
                height_cm = excluded.height_cm,
                activity_level = excluded.activity_level,
                goal_type = excluded.goal_type,
                daily_calories = excluded.daily_calories,
                daily_protein = excluded.daily_protein,
                daily_carbs = excluded.daily_carbs,
                daily_fat = excluded.daily_fat,
                updated_at = excluded.updated_at
            "#,
            params![
                goals.user_id,
                goals.age,
                goals.sex.map(|s| s.as_str()),
                goals.weight_kg,
                goals.height_cm,
                goals.activity_level.map(|a| a.as_str()),
                goals.goal_type.map(|g| g.as_str()),
                goals.daily_calories,
                goals.daily_protein,
                goals.daily_carbs,
                goals.daily_fat,
                now,
            ],
        )?;

        Self::get_for_user(conn, goals.user_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{NutritionEntry, NutritionEntryCreate, User};

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let user = User::get_or_create(&conn, "alice").unwrap();
        (conn, user.id)
    }

    fn sample(user_id: i64) -> UserGoals {
        UserGoals {
            user_id,
            age: Some(30),
            sex: Some(Sex::Male),
            weight_kg: Some(80.0),
            height_cm: None,
            activity_level: Some(ActivityLevel::VeryActive),
            goal_type: Some(GoalType::Lose),
            daily_calories: 2000,
            daily_protein: 150.0,
            daily_carbs: 200.0,
            daily_fat: 65.0,
        }
    }

    #[test]
    fn test_absent_until_saved() {
        let (conn, user_id) = setup();
        assert!(UserGoals::get_for_user(&conn, user_id).unwrap().is_none());
        let saved = UserGoals::save(&conn, &sample(user_id)).unwrap();
        assert_eq!(saved, sample(user_id));
    }

    #[test]
    fn test_save_replaces_existing_row() {
        let (conn, user_id) = setup();
        UserGoals::save(&conn, &sample(user_id)).unwrap();
        let mut next = sample(user_id);
        next.daily_calories = 1800;
        next.age = None;
        let saved = UserGoals::save(&conn, &next).unwrap();
        assert_eq!(saved.daily_calories, 1800);
        assert_eq!(saved.age, None);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_goals", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_unknown_activity_level_reads_as_unset() {
        let (conn, user_id) = setup();
        UserGoals::save(&conn, &sample(user_id)).unwrap();
        conn.execute("UPDATE user_goals SET activity_level = 'couch_potato'", []).unwrap();
        let goals = UserGoals::get_for_user(&conn, user_id).unwrap().unwrap();
        assert_eq!(goals.activity_level, None);
    }

    #[test]
    fn test_deleting_user_cascades() {
        let (conn, user_id) = setup();
        UserGoals::save(&conn, &sample(user_id)).unwrap();
        NutritionEntry::create(
            &conn,
            user_id,
            &NutritionEntryCreate {
                name: "Oatmeal".to_string(),
                calories: 300,
                protein: 10.0,
                carbs: 54.0,
                fat: 5.0,
                fiber: 8.0,
                description: None,
                image_url: None,
                consumed_at: Utc::now(),
            },
        )
        .unwrap();

        assert!(User::delete(&conn, user_id).unwrap());
        assert!(UserGoals::get_for_user(&conn, user_id).unwrap().is_none());
        assert_eq!(NutritionEntry::count_for_user(&conn, user_id).unwrap(), 0);
    }
}
