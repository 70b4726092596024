//! Nutrition Entry model
//!
//! One logged meal. Entries are always addressed by id *and* owner; an id that
//! belongs to someone else behaves exactly like a missing one.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{format_timestamp, timestamp_column, DbResult};
use super::Macros;

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEntry {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub calories: i64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
    pub fiber: f64,   // grams
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Decides the day bucket
    pub consumed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for logging a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEntryCreate {
    pub name: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub consumed_at: DateTime<Utc>,
}

/// Field-level edit; `None` leaves the stored value alone. A blank
/// `description` or `image_url` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionEntryUpdate {
    pub name: Option<String>,
    pub calories: Option<i64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl NutritionEntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.fiber.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.consumed_at.is_none()
    }
}

impl NutritionEntry {
    pub fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }

    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            calories: row.get("calories")?,
            protein: row.get("protein")?,
            carbs: row.get("carbs")?,
            fat: row.get("fat")?,
            fiber: row.get("fiber")?,
            description: row.get("description")?,
            image_url: row.get("image_url")?,
            consumed_at: timestamp_column(row, "consumed_at")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }

    /// Log a new entry for `user_id`
    pub fn create(conn: &Connection, user_id: i64, data: &NutritionEntryCreate) -> DbResult<Self> {
        let now = format_timestamp(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO nutrition_entries (
                user_id, name, calories, protein, carbs, fat, fiber,
                description, image_url, consumed_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
            params![
                user_id,
                data.name,
                data.calories,
                data.protein,
                data.carbs,
                data.fat,
                data.fiber,
                data.description,
                data.image_url,
                format_timestamp(&data.consumed_at),
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get(conn, user_id, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an entry by id, scoped to its owner
    pub fn get(conn: &Connection, user_id: i64, id: i64) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM nutrition_entries WHERE id = ?1 AND user_id = ?2")?;

        let result = stmt.query_row(params![id, user_id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List a user's entries, optionally within an inclusive `[start, end]` range,
    /// oldest first
    pub fn list_for_user(
        conn: &Connection,
        user_id: i64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Self>> {
        let mut sql = String::from("SELECT * FROM nutrition_entries WHERE user_id = ?1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(start) = start {
            params_vec.push(Box::new(format_timestamp(&start)));
            sql.push_str(&format!(" AND consumed_at >= ?{}", params_vec.len()));
        }

        if let Some(end) = end {
            params_vec.push(Box::new(format_timestamp(&end)));
            sql.push_str(&format!(" AND consumed_at <= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY consumed_at, id");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let entries = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Apply a field-level edit. Returns `None` if the entry does not exist for this user.
    pub fn update(
        conn: &Connection,
        user_id: i64,
        id: i64,
        data: &NutritionEntryUpdate,
    ) -> DbResult<Option<Self>> {
        if Self::get(conn, user_id, id)?.is_none() {
            return Ok(None);
        }

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            params_vec.push(Box::new(name.clone()));
            updates.push(format!("name = ?{}", params_vec.len()));
        }
        if let Some(calories) = data.calories {
            params_vec.push(Box::new(calories));
            updates.push(format!("calories = ?{}", params_vec.len()));
        }
        if let Some(protein) = data.protein {
            params_vec.push(Box::new(protein));
            updates.push(format!("protein = ?{}", params_vec.len()));
        }
        if let Some(carbs) = data.carbs {
            params_vec.push(Box::new(carbs));
            updates.push(format!("carbs = ?{}", params_vec.len()));
        }
        if let Some(fat) = data.fat {
            params_vec.push(Box::new(fat));
            updates.push(format!("fat = ?{}", params_vec.len()));
        }
        if let Some(fiber) = data.fiber {
            params_vec.push(Box::new(fiber));
            updates.push(format!("fiber = ?{}", params_vec.len()));
        }
        if let Some(ref description) = data.description {
            params_vec.push(Box::new(non_blank(description)));
            updates.push(format!("description = ?{}", params_vec.len()));
        }
        if let Some(ref image_url) = data.image_url {
            params_vec.push(Box::new(non_blank(image_url)));
            updates.push(format!("image_url = ?{}", params_vec.len()));
        }
        if let Some(consumed_at) = data.consumed_at {
            params_vec.push(Box::new(format_timestamp(&consumed_at)));
            updates.push(format!("consumed_at = ?{}", params_vec.len()));
        }

        if !updates.is_empty() {
            params_vec.push(Box::new(format_timestamp(&Utc::now())));
            updates.push(format!("updated_at = ?{}", params_vec.len()));

            params_vec.push(Box::new(id));
            let id_idx = params_vec.len();
            params_vec.push(Box::new(user_id));
            let user_idx = params_vec.len();

            let sql = format!(
                "UPDATE nutrition_entries SET {} WHERE id = ?{} AND user_id = ?{}",
                updates.join(", "),
                id_idx,
                user_idx
            );
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|p| p.as_ref()).collect();
            conn.execute(&sql, params_refs.as_slice())?;
        }

        Self::get(conn, user_id, id)
    }

    /// Delete an entry owned by `user_id`
    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM nutrition_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Count a user's entries
    pub fn count_for_user(conn: &Connection, user_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nutrition_entries WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| value.to_string())
}
