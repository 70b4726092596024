//! Nutrition Entry Tools
//!
//! Logging, editing and listing meals, including meals estimated by the AI
//! provider.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::models::{NutritionEntry, NutritionEntryCreate, NutritionEntryUpdate};
use crate::nutrition::estimate::parse_provider_reply;

/// Response for list_entries
#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub entries: Vec<NutritionEntry>,
    pub total: usize,
}

/// Outcome of logging a scanned meal. Provider failures are an outcome, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Logged { entry: NutritionEntry },
    Failed { error: String, message: String },
}

fn check_grams(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

fn validate_create(data: &NutritionEntryCreate) -> Result<(), String> {
    if data.name.trim().is_empty() {
        return Err("Name must not be empty".to_string());
    }
    if data.calories < 0 {
        return Err("Calories must not be negative".to_string());
    }
    check_grams("protein", data.protein)?;
    check_grams("carbs", data.carbs)?;
    check_grams("fat", data.fat)?;
    check_grams("fiber", data.fiber)
}

fn validate_update(data: &NutritionEntryUpdate) -> Result<(), String> {
    if matches!(data.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err("Name must not be empty".to_string());
    }
    if matches!(data.calories, Some(c) if c < 0) {
        return Err("Calories must not be negative".to_string());
    }
    for (field, value) in [
        ("protein", data.protein),
        ("carbs", data.carbs),
        ("fat", data.fat),
        ("fiber", data.fiber),
    ] {
        if let Some(v) = value {
            check_grams(field, v)?;
        }
    }
    Ok(())
}

/// Log a meal
pub fn log_entry(db: &Database, user_id: i64, data: NutritionEntryCreate) -> Result<NutritionEntry, String> {
    validate_create(&data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = NutritionEntry::create(&conn, user_id, &data)
        .map_err(|e| format!("Failed to log entry: {}", e))?;

    tracing::info!(user_id, entry_id = entry.id, calories = entry.calories, "logged entry");
    Ok(entry)
}

/// Log a meal from a raw provider reply (HTTP status + body)
pub fn log_scanned_meal(
    db: &Database,
    user_id: i64,
    status: u16,
    body: &str,
    consumed_at: DateTime<Utc>,
    image_url: Option<String>,
) -> Result<ScanOutcome, String> {
    match parse_provider_reply(status, body) {
        Ok(estimate) => {
            let entry = log_entry(db, user_id, estimate.into_entry(consumed_at, image_url))?;
            Ok(ScanOutcome::Logged { entry })
        }
        Err(e) => {
            tracing::warn!(user_id, status, kind = e.kind(), "meal estimate unavailable");
            Ok(ScanOutcome::Failed {
                error: e.kind().to_string(),
                message: e.to_string(),
            })
        }
    }
}

/// Get an entry by ID
pub fn get_entry(db: &Database, user_id: i64, id: i64) -> Result<Option<NutritionEntry>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    NutritionEntry::get(&conn, user_id, id)
        .map_err(|e| format!("Failed to get entry: {}", e))
}

/// List entries within an optional inclusive range
pub fn list_entries(
    db: &Database,
    user_id: i64,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<ListEntriesResponse, String> {
    let entries = load_entries(db, user_id, start, end)?;
    let total = entries.len();
    Ok(ListEntriesResponse { entries, total })
}

/// Snapshot of a user's entries for the calculators
pub(crate) fn load_entries(
    db: &Database,
    user_id: i64,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<NutritionEntry>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    NutritionEntry::list_for_user(&conn, user_id, start, end)
        .map_err(|e| format!("Failed to list entries: {}", e))
}

/// Edit an entry
pub fn update_entry(
    db: &Database,
    user_id: i64,
    id: i64,
    data: NutritionEntryUpdate,
) -> Result<Option<NutritionEntry>, String> {
    validate_update(&data)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let updated = NutritionEntry::update(&conn, user_id, id, &data)
        .map_err(|e| format!("Failed to update entry: {}", e))?;

    if updated.is_some() {
        tracing::info!(user_id, entry_id = id, "updated entry");
    }
    Ok(updated)
}

/// Delete an entry
pub fn delete_entry(db: &Database, user_id: i64, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = NutritionEntry::delete(&conn, user_id, id)
        .map_err(|e| format!("Failed to delete entry: {}", e))?;

    if deleted {
        tracing::info!(user_id, entry_id = id, "deleted entry");
    }
    Ok(deleted)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::User;
    use chrono::TimeZone;

    pub(crate) fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user_id = db
            .with_conn(|conn| {
                run_migrations(conn)?;
                Ok(User::get_or_create(conn, "alice")?.id)
            })
            .unwrap();
        (db, user_id)
    }

    pub(crate) fn meal(name: &str, calories: i64, consumed_at: DateTime<Utc>) -> NutritionEntryCreate {
        NutritionEntryCreate {
            name: name.to_string(),
            calories,
            protein: 20.0,
            carbs: 30.0,
            fat: 10.0,
            fiber: 0.0,
            description: None,
            image_url: None,
            consumed_at,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_log_and_list() {
        let (db, user_id) = setup();
        log_entry(&db, user_id, meal("Pasta", 650, noon())).unwrap();
        let listed = list_entries(&db, user_id, None, None).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.entries[0].name, "Pasta");
    }

    #[test]
    fn test_log_rejects_invalid_input() {
        let (db, user_id) = setup();
        assert!(log_entry(&db, user_id, meal("  ", 100, noon())).is_err());
        assert!(log_entry(&db, user_id, meal("Soup", -1, noon())).is_err());

        let mut bad = meal("Soup", 100, noon());
        bad.fat = f64::NAN;
        assert!(log_entry(&db, user_id, bad).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let (db, user_id) = setup();
        let entry = log_entry(&db, user_id, meal("Pasta", 650, noon())).unwrap();

        let bad = NutritionEntryUpdate { protein: Some(-2.0), ..Default::default() };
        assert!(update_entry(&db, user_id, entry.id, bad).is_err());

        let edit = NutritionEntryUpdate { calories: Some(700), ..Default::default() };
        let updated = update_entry(&db, user_id, entry.id, edit).unwrap().unwrap();
        assert_eq!(updated.calories, 700);

        assert!(update_entry(&db, user_id, 9999, NutritionEntryUpdate::default()).unwrap().is_none());
        assert!(delete_entry(&db, user_id, entry.id).unwrap());
        assert!(get_entry(&db, user_id, entry.id).unwrap().is_none());
    }

    #[test]
    fn test_log_scanned_meal() {
        let (db, user_id) = setup();
        let body = r#"{"name": "Poke bowl", "calories": 689.7, "protein": 41.2, "carbs": 70.1, "fat": 21.0, "fiber": 6.5}"#;
        match log_scanned_meal(&db, user_id, 200, body, noon(), None).unwrap() {
            ScanOutcome::Logged { entry } => {
                assert_eq!(entry.calories, 690);
                assert_eq!(entry.fiber, 6.5);
            }
            other => panic!("expected logged entry, got {:?}", other),
        }
    }

    #[test]
    fn test_log_scanned_meal_tolerates_provider_failure() {
        let (db, user_id) = setup();
        match log_scanned_meal(&db, user_id, 429, "rate limited", noon(), None).unwrap() {
            ScanOutcome::Failed { error, .. } => assert_eq!(error, "rate_limit"),
            other => panic!("expected failure outcome, got {:?}", other),
        }
        assert_eq!(list_entries(&db, user_id, None, None).unwrap().total, 0);
    }
}
