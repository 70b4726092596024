//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

/// Migration v1: users, nutrition entries, goals
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS
        -- Every other row is owned by exactly one user
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        -- ============================================
        -- NUTRITION ENTRIES
        -- One logged meal. Timestamps are fixed-width RFC 3339 UTC
        -- (2026-10-18T07:30:00.000Z) so text order is time order.
        -- ============================================
        CREATE TABLE nutrition_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL CHECK(length(name) > 0),

            calories INTEGER NOT NULL DEFAULT 0 CHECK(calories >= 0),
            protein REAL NOT NULL DEFAULT 0 CHECK(protein >= 0),   -- grams
            carbs REAL NOT NULL DEFAULT 0 CHECK(carbs >= 0),       -- grams
            fat REAL NOT NULL DEFAULT 0 CHECK(fat >= 0),           -- grams
            fiber REAL NOT NULL DEFAULT 0 CHECK(fiber >= 0),       -- grams

            description TEXT,
            image_url TEXT,
            consumed_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX idx_nutrition_entries_user_consumed
            ON nutrition_entries(user_id, consumed_at);

        -- ============================================
        -- USER GOALS
        -- At most one per user; absence means onboarding is incomplete
        -- ============================================
        CREATE TABLE user_goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,

            -- Profile (each optional)
            age INTEGER CHECK(age IS NULL OR age > 0),
            sex TEXT CHECK(sex IS NULL OR sex IN ('male', 'female')),
            weight_kg REAL CHECK(weight_kg IS NULL OR weight_kg > 0),
            height_cm REAL CHECK(height_cm IS NULL OR height_cm > 0),
            activity_level TEXT,
            goal_type TEXT CHECK(goal_type IS NULL OR goal_type IN ('lose', 'maintain', 'gain')),

            -- Targets (always present)
            daily_calories INTEGER NOT NULL,
            daily_protein REAL NOT NULL,
            daily_carbs REAL NOT NULL,
            daily_fat REAL NOT NULL,

            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
