//! Account Tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{NutritionEntry, User, UserGoals};

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub user: User,
    pub entry_count: i64,
    pub has_goals: bool,
}

/// Who the server is acting for, and how much data they have
pub fn whoami(db: &Database, user_id: i64) -> Result<Option<AccountSummary>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(user) = User::get_by_id(&conn, user_id).map_err(|e| format!("Failed to get user: {}", e))? else {
        return Ok(None);
    };
    let entry_count = NutritionEntry::count_for_user(&conn, user_id)
        .map_err(|e| format!("Failed to count entries: {}", e))?;
    let has_goals = UserGoals::get_for_user(&conn, user_id)
        .map_err(|e| format!("Failed to get goals: {}", e))?
        .is_some();

    Ok(Some(AccountSummary { user, entry_count, has_goals }))
}

/// Get or create the named account the server acts for
pub fn open_account(db: &Database, name: &str) -> Result<User, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    User::get_or_create(&conn, name).map_err(|e| format!("Failed to open account: {}", e))
}

/// Delete the user together with every entry and the goals record.
/// Requires `confirm`; returns whether a user was removed.
pub fn delete_account(db: &Database, user_id: i64, confirm: bool) -> Result<bool, String> {
    if !confirm {
        return Err("Deleting an account removes all entries and goals. Pass confirm=true to proceed.".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = User::delete(&conn, user_id).map_err(|e| format!("Failed to delete account: {}", e))?;

    if deleted {
        tracing::warn!(user_id, "deleted account and all data");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::goals::GoalsPatch;
    use crate::tools::entries::log_entry;
    use crate::tools::entries::tests::{meal, setup};
    use crate::tools::goals::save_goals;
    use chrono::Utc;

    #[test]
    fn test_whoami() {
        let (db, user_id) = setup();
        log_entry(&db, user_id, meal("Toast", 250, Utc::now())).unwrap();

        let summary = whoami(&db, user_id).unwrap().unwrap();
        assert_eq!(summary.user.name, "alice");
        assert_eq!(summary.entry_count, 1);
        assert!(!summary.has_goals);
        assert!(whoami(&db, user_id + 1).unwrap().is_none());
    }

    #[test]
    fn test_delete_account_requires_confirm() {
        let (db, user_id) = setup();
        assert!(delete_account(&db, user_id, false).is_err());
        assert!(whoami(&db, user_id).unwrap().is_some());
    }

    #[test]
    fn test_delete_account_removes_everything() {
        let (db, user_id) = setup();
        log_entry(&db, user_id, meal("Toast", 250, Utc::now())).unwrap();
        save_goals(&db, user_id, GoalsPatch::default()).unwrap();

        assert!(delete_account(&db, user_id, true).unwrap());
        assert!(whoami(&db, user_id).unwrap().is_none());

        let leftover: (i64, i64) = db
            .with_conn(|conn| {
                let entries = NutritionEntry::count_for_user(conn, user_id)?;
                let goals = UserGoals::get_for_user(conn, user_id)?.map_or(0, |_| 1);
                Ok((entries, goals))
            })
            .unwrap();
        assert_eq!(leftover, (0, 0));
        assert!(!delete_account(&db, user_id, true).unwrap());
    }

    #[test]
    fn test_open_account_after_delete_starts_empty() {
        let (db, user_id) = setup();
        log_entry(&db, user_id, meal("Toast", 250, Utc::now())).unwrap();
        delete_account(&db, user_id, true).unwrap();

        let reopened = open_account(&db, "alice").unwrap();
        assert_ne!(reopened.id, user_id);
        log_entry(&db, reopened.id, meal("Soup", 180, Utc::now())).unwrap();

        let summary = whoami(&db, reopened.id).unwrap().unwrap();
        assert_eq!(summary.entry_count, 1);
        assert!(!summary.has_goals);
    }
}
