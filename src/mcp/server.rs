//! Macro Tracker MCP Server Implementation
//!
//! Implements the MCP server with all Macro Tracker tools. The server acts on
//! behalf of the single account named in the config.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, FixedOffset, Local, NaiveDate, Utc};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::models::{NutritionEntryCreate, NutritionEntryUpdate};
use crate::nutrition::aggregate::{day_bounds, day_start, span_bounds};
use crate::nutrition::goals::GoalsPatch;
use crate::nutrition::metabolic::{ActivityLevel, GoalType, Sex};
use crate::tools::status::{StatusTracker, USAGE_INSTRUCTIONS};
use crate::tools::{account, entries, goals, parse_date, parse_instant, progress};

/// Days covered by get_daily_series when no range is given
const DEFAULT_SERIES_DAYS: i64 = 7;

/// Macro Tracker MCP Service
#[derive(Clone)]
pub struct MacroTrackService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    config: Arc<Config>,
    /// Replaced when the account is deleted and reopened
    user_id: Arc<AtomicI64>,
    tool_router: ToolRouter<MacroTrackService>,
}

impl MacroTrackService {
    pub fn new(config: Config, database: Database, user_id: i64) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config.database_path.clone()))),
            database,
            config: Arc::new(config),
            user_id: Arc::new(AtomicI64::new(user_id)),
            tool_router: Self::tool_router(),
        }
    }

    fn user_id(&self) -> i64 {
        self.user_id.load(Ordering::SeqCst)
    }

    /// Zone used for day buckets: the configured offset, else the host's
    /// current local offset
    fn zone(&self) -> FixedOffset {
        self.config.utc_offset.unwrap_or_else(|| *Local::now().offset())
    }

    fn today(&self, tz: &FixedOffset) -> NaiveDate {
        Utc::now().with_timezone(tz).date_naive()
    }

    fn date_or_today(&self, date: Option<&str>, tz: &FixedOffset) -> Result<NaiveDate, McpError> {
        match date {
            Some(s) => parse_date(s).map_err(invalid_params),
            None => Ok(self.today(tz)),
        }
    }
}

fn invalid_params(message: String) -> McpError {
    McpError::invalid_params(message, None)
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        what, id
    ))]))
}

fn not_onboarded() -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        r#"{"error": "No goals saved yet. Complete onboarding with save_goals or update_profile."}"#,
    )]))
}

fn parse_enum<T>(field: &str, raw: Option<&str>, parse: fn(&str) -> Option<T>) -> Result<Option<T>, McpError> {
    match raw {
        None => Ok(None),
        Some(s) => parse(s)
            .map(Some)
            .ok_or_else(|| invalid_params(format!("Invalid {} '{}'", field, s))),
    }
}

// ============================================================================
// Entry Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogEntryParams {
    /// Meal name, e.g. "Chicken salad"
    pub name: String,
    /// Whole calories
    pub calories: i64,
    /// Grams
    pub protein: f64,
    /// Grams
    pub carbs: f64,
    /// Grams
    pub fat: f64,
    /// Grams
    #[serde(default)]
    pub fiber: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// RFC 3339, or a local date-time like 2026-10-18T12:30. Defaults to now.
    pub consumed_at: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogScannedMealParams {
    /// HTTP status returned by the vision provider
    pub status: u16,
    /// Raw response body from the provider
    pub body: String,
    pub image_url: Option<String>,
    /// Defaults to now
    pub consumed_at: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EntryIdParams {
    /// Entry ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEntriesParams {
    /// First day (YYYY-MM-DD), inclusive
    pub start_date: Option<String>,
    /// Last day (YYYY-MM-DD), inclusive
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateEntryParams {
    /// Entry ID
    pub id: i64,
    pub name: Option<String>,
    pub calories: Option<i64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    /// Empty string clears the description
    pub description: Option<String>,
    /// Empty string clears the image
    pub image_url: Option<String>,
    pub consumed_at: Option<String>,
}

// ============================================================================
// Progress Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// Day (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    /// First day (YYYY-MM-DD), inclusive
    pub start_date: String,
    /// Last day (YYYY-MM-DD), inclusive
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SeriesParams {
    /// First day (YYYY-MM-DD), defaults to six days before end_date
    pub start_date: Option<String>,
    /// Last day (YYYY-MM-DD), defaults to today
    pub end_date: Option<String>,
}

// ============================================================================
// Goals Parameter Structs
// ============================================================================

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GoalsParams {
    pub age: Option<u32>,
    /// male | female
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    /// sedentary | light | moderate | active | very_active
    pub activity_level: Option<String>,
    /// lose | maintain | gain
    pub goal_type: Option<String>,
    pub daily_calories: Option<i64>,
    pub daily_protein: Option<f64>,
    pub daily_carbs: Option<f64>,
    pub daily_fat: Option<f64>,
}

impl GoalsParams {
    fn into_patch(self) -> Result<GoalsPatch, McpError> {
        Ok(GoalsPatch {
            age: self.age,
            sex: parse_enum("sex", self.sex.as_deref(), Sex::from_str)?,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            activity_level: parse_enum("activity_level", self.activity_level.as_deref(), ActivityLevel::from_str)?,
            goal_type: parse_enum("goal_type", self.goal_type.as_deref(), GoalType::from_str)?,
            daily_calories: self.daily_calories,
            daily_protein: self.daily_protein,
            daily_carbs: self.daily_carbs,
            daily_fat: self.daily_fat,
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMetricsParams {
    /// Calorie target to evaluate, defaults to the saved daily target
    pub target_calories: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SuggestGoalsParams {
    /// lose | maintain | gain, defaults to the saved goal type
    pub goal_type: Option<String>,
    /// Save the suggested targets
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertUnitsParams {
    /// kg_to_lbs | lbs_to_kg | cm_to_feet_inches | feet_inches_to_cm
    pub conversion: String,
    /// Value to convert (feet for feet_inches_to_cm)
    pub value: f64,
    /// Inches, only for feet_inches_to_cm
    pub inches: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteAccountParams {
    /// Must be true
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
struct DeleteAccountResponse {
    success: bool,
    user: String,
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: crate::tools::status::MacroTrackStatus,
    account: Option<account::AccountSummary>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MacroTrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the Macro Tracker service including build info, database status, the active account and process information")]
    async fn macrotrack_status(&self) -> Result<CallToolResult, McpError> {
        let offset = self.zone().to_string();
        let status = {
            let tracker = self.status_tracker.lock().await;
            tracker.get_status(&self.config.user, &offset)
        };
        let account = account::whoami(&self.database, self.user_id()).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&StatusResponse { status, account })
    }

    #[tool(description = "Get instructions for logging meals, reading totals and streaks, and managing goals. Call this when starting a session or when unsure how to use the tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Entries ---

    #[tool(description = "Log a meal with whole calories and protein/carbs/fat/fiber in grams")]
    fn log_entry(&self, Parameters(p): Parameters<LogEntryParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let consumed_at = match p.consumed_at.as_deref() {
            Some(s) => parse_instant(s, &tz).map_err(invalid_params)?,
            None => Utc::now(),
        };
        let data = NutritionEntryCreate {
            name: p.name, calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
            fiber: p.fiber, description: p.description, image_url: p.image_url, consumed_at,
        };
        let result = entries::log_entry(&self.database, self.user_id(), data).map_err(invalid_params)?;
        to_json(&result)
    }

    #[tool(description = "Log a meal from a vision model's raw reply (HTTP status and body). Provider failures are reported without logging anything.")]
    fn log_scanned_meal(&self, Parameters(p): Parameters<LogScannedMealParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let consumed_at = match p.consumed_at.as_deref() {
            Some(s) => parse_instant(s, &tz).map_err(invalid_params)?,
            None => Utc::now(),
        };
        let result = entries::log_scanned_meal(&self.database, self.user_id(), p.status, &p.body, consumed_at, p.image_url)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a logged meal by ID")]
    fn get_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        match entries::get_entry(&self.database, self.user_id(), p.id).map_err(|e| McpError::internal_error(e, None))? {
            Some(entry) => to_json(&entry),
            None => not_found("Entry", p.id),
        }
    }

    #[tool(description = "List logged meals, oldest first, optionally limited to an inclusive date range")]
    fn list_entries(&self, Parameters(p): Parameters<ListEntriesParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let start = p.start_date.as_deref().map(parse_date).transpose().map_err(invalid_params)?;
        let end = p.end_date.as_deref().map(parse_date).transpose().map_err(invalid_params)?;

        let (from, to) = match (start, end) {
            (Some(s), Some(e)) if s > e => {
                return Err(invalid_params("start_date must not be after end_date".to_string()))
            }
            (Some(s), Some(e)) => {
                let (from, to) = span_bounds(s, e, &tz);
                (Some(from), Some(to))
            }
            (Some(s), None) => (Some(day_start(s, &tz)), None),
            (None, Some(e)) => (None, Some(day_bounds(e, &tz).1)),
            (None, None) => (None, None),
        };

        let result = entries::list_entries(&self.database, self.user_id(), from, to).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Edit a logged meal. Only the given fields change.")]
    fn update_entry(&self, Parameters(p): Parameters<UpdateEntryParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let consumed_at = p.consumed_at.as_deref().map(|s| parse_instant(s, &tz)).transpose().map_err(invalid_params)?;
        let data = NutritionEntryUpdate {
            name: p.name, calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
            fiber: p.fiber, description: p.description, image_url: p.image_url, consumed_at,
        };
        match entries::update_entry(&self.database, self.user_id(), p.id, data).map_err(invalid_params)? {
            Some(entry) => to_json(&entry),
            None => not_found("Entry", p.id),
        }
    }

    #[tool(description = "Delete a logged meal")]
    fn delete_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let deleted = entries::delete_entry(&self.database, self.user_id(), p.id).map_err(|e| McpError::internal_error(e, None))?;
        if !deleted {
            return not_found("Entry", p.id);
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            r#"{{"success": true, "deleted_id": {}}}"#,
            p.id
        ))]))
    }

    // --- Totals and streaks ---

    #[tool(description = "Total calories and macros for one day (defaults to today)")]
    fn get_daily_totals(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let date = self.date_or_today(p.date.as_deref(), &tz)?;
        let result = progress::get_daily_totals(&self.database, self.user_id(), date, &tz).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Totals and per-day averages over an inclusive date range")]
    fn get_range_totals(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let start = parse_date(&p.start_date).map_err(invalid_params)?;
        let end = parse_date(&p.end_date).map_err(invalid_params)?;
        let result = progress::get_range_totals(&self.database, self.user_id(), start, end, &tz).map_err(invalid_params)?;
        to_json(&result)
    }

    #[tool(description = "Per-day totals for every day in a range, including empty days (defaults to the last 7 days)")]
    fn get_daily_series(&self, Parameters(p): Parameters<SeriesParams>) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let end = self.date_or_today(p.end_date.as_deref(), &tz)?;
        let start = match p.start_date.as_deref() {
            Some(s) => parse_date(s).map_err(invalid_params)?,
            None => end
                .checked_sub_signed(Duration::days(DEFAULT_SERIES_DAYS - 1))
                .unwrap_or(NaiveDate::MIN),
        };
        let result = progress::get_daily_series(&self.database, self.user_id(), start, end, &tz).map_err(invalid_params)?;
        to_json(&result)
    }

    #[tool(description = "Current logging streak: consecutive days with at least one meal, ending today (or yesterday if nothing is logged yet today)")]
    fn get_streak(&self) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let today = self.today(&tz);
        let result = progress::get_streak(&self.database, self.user_id(), today, &tz, self.config.streak_cap_days)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Home screen summary: today's totals and meals, goal progress, streak and this week's totals")]
    fn get_dashboard(&self) -> Result<CallToolResult, McpError> {
        let tz = self.zone();
        let today = self.today(&tz);
        let result = progress::get_dashboard(&self.database, self.user_id(), today, &tz, self.config.streak_cap_days)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Goals ---

    #[tool(description = "Get goals, profile and BMR/TDEE metrics, with weight in lbs and height in ft/in")]
    fn get_goals(&self) -> Result<CallToolResult, McpError> {
        match goals::get_goals(&self.database, self.user_id()).map_err(|e| McpError::internal_error(e, None))? {
            Some(view) => to_json(&view),
            None => not_onboarded(),
        }
    }

    #[tool(description = "Onboarding wizard save. Replaces all goals; omitted targets default to 2000 kcal, 150 g protein, 250 g carbs, 65 g fat.")]
    fn save_goals(&self, Parameters(p): Parameters<GoalsParams>) -> Result<CallToolResult, McpError> {
        let patch = p.into_patch()?;
        let result = goals::save_goals(&self.database, self.user_id(), patch).map_err(invalid_params)?;
        to_json(&result)
    }

    #[tool(description = "Edit profile fields (age, sex, weight_kg, height_cm, activity_level, goal_type). Macro targets are left untouched.")]
    fn update_profile(&self, Parameters(p): Parameters<GoalsParams>) -> Result<CallToolResult, McpError> {
        let patch = p.into_patch()?;
        let result = goals::update_profile(&self.database, self.user_id(), patch).map_err(invalid_params)?;
        to_json(&result)
    }

    #[tool(description = "BMR, TDEE, daily deficit and projected weekly weight change (lbs) for a calorie target")]
    fn get_metrics(&self, Parameters(p): Parameters<GetMetricsParams>) -> Result<CallToolResult, McpError> {
        match goals::get_metrics(&self.database, self.user_id(), p.target_calories).map_err(|e| McpError::internal_error(e, None))? {
            Some(metrics) => to_json(&metrics),
            None => not_onboarded(),
        }
    }

    #[tool(description = "Suggest calorie and macro targets from the profile for a goal; set apply=true to save them")]
    fn suggest_goals(&self, Parameters(p): Parameters<SuggestGoalsParams>) -> Result<CallToolResult, McpError> {
        let goal_type = parse_enum("goal_type", p.goal_type.as_deref(), GoalType::from_str)?;
        match goals::suggest_goals(&self.database, self.user_id(), goal_type, p.apply).map_err(|e| McpError::internal_error(e, None))? {
            Some(result) => to_json(&result),
            None => not_onboarded(),
        }
    }

    #[tool(description = "Convert body measurements between kg/lbs and cm/feet-inches")]
    fn convert_units(&self, Parameters(p): Parameters<ConvertUnitsParams>) -> Result<CallToolResult, McpError> {
        let result = goals::convert_units(&p.conversion, p.value, p.inches).map_err(invalid_params)?;
        to_json(&result)
    }

    // --- Account ---

    #[tool(description = "Permanently delete the account with all meals and goals. Requires confirm=true.")]
    fn delete_account(&self, Parameters(p): Parameters<DeleteAccountParams>) -> Result<CallToolResult, McpError> {
        let deleted = account::delete_account(&self.database, self.user_id(), p.confirm).map_err(invalid_params)?;

        // Later calls act on a fresh, empty account under the same name
        let reopened = account::open_account(&self.database, &self.config.user).map_err(|e| McpError::internal_error(e, None))?;
        self.user_id.store(reopened.id, Ordering::SeqCst);

        to_json(&DeleteAccountResponse { success: deleted, user: reopened.name, user_id: reopened.id })
    }
}

#[tool_handler]
impl ServerHandler for MacroTrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "macrotrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Macro Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Macro Tracker - meal logging with daily totals, streaks and goal metrics. \
                 IMPORTANT: Call usage_instructions first. \
                 Meals: log_entry, log_scanned_meal, get/list/update/delete_entry. \
                 Totals: get_daily_totals, get_range_totals, get_daily_series, get_streak, get_dashboard. \
                 Goals: get_goals, save_goals (full replace), update_profile (profile only), get_metrics, suggest_goals. \
                 Utilities: convert_units, macrotrack_status. \
                 delete_account requires confirm=true."
                    .into(),
            ),
        }
    }
}
