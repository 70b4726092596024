//! AI meal estimates
//!
//! The vision/chat provider lives outside this crate. What arrives here is its
//! raw reply: an HTTP status plus a body that is either an estimate JSON object
//! (sometimes wrapped in a markdown code fence) or an error. Errors are
//! classified into a small taxonomy and handed back to the caller, never raised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::NutritionEntryCreate;
use super::aggregate::whole_calories;

/// Name used when the provider returns an empty one
pub const FALLBACK_MEAL_NAME: &str = "Scanned meal";

/// Upstream provider failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("No API key configured for the nutrition provider")]
    MissingKey,

    #[error("The nutrition provider rejected the API key")]
    InvalidKey,

    #[error("The nutrition provider is rate limiting requests, try again shortly")]
    RateLimited,

    #[error("The nutrition provider quota is exhausted")]
    QuotaExceeded,

    #[error("Nutrition provider error: {0}")]
    Provider(String),

    #[error("Could not read the nutrition estimate: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Stable machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::MissingKey => "missing_key",
            ProviderError::InvalidKey => "invalid_key",
            ProviderError::RateLimited => "rate_limit",
            ProviderError::QuotaExceeded => "quota_exceeded",
            ProviderError::Provider(_) => "provider_error",
            ProviderError::Malformed(_) => "malformed_estimate",
        }
    }

    /// Map a non-success provider reply onto the taxonomy
    pub fn classify(status: u16, body: &str) -> Self {
        let lower = body.to_lowercase();

        if mentions_any(&lower, &["missing api key", "no api key", "api key not set", "api key is required"]) {
            return ProviderError::MissingKey;
        }

        match status {
            401 | 403 => ProviderError::InvalidKey,
            402 => ProviderError::QuotaExceeded,
            429 if mentions_any(&lower, &["quota", "billing", "credit"]) => ProviderError::QuotaExceeded,
            429 => ProviderError::RateLimited,
            _ if mentions_any(&lower, &["invalid api key", "invalid x-api-key", "incorrect api key"]) => {
                ProviderError::InvalidKey
            }
            _ if mentions_any(&lower, &["insufficient_quota", "quota exceeded"]) => ProviderError::QuotaExceeded,
            _ => ProviderError::Provider(summarise(body, status)),
        }
    }
}

fn mentions_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

fn summarise(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status);
    }
    let short: String = trimmed.chars().take(200).collect();
    format!("HTTP {}: {}", status, short)
}

/// Estimate as the provider reports it; numbers may be fractional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEstimate {
    #[serde(default)]
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MealEstimate {
    /// Turn the estimate into an entry: calories rounded to whole numbers,
    /// grams clamped at zero, fiber defaulted to zero.
    pub fn into_entry(self, consumed_at: DateTime<Utc>, image_url: Option<String>) -> NutritionEntryCreate {
        let name = self.name.trim();
        NutritionEntryCreate {
            name: if name.is_empty() { FALLBACK_MEAL_NAME.to_string() } else { name.to_string() },
            calories: whole_calories(self.calories),
            protein: non_negative(self.protein),
            carbs: non_negative(self.carbs),
            fat: non_negative(self.fat),
            fiber: self.fiber.map_or(0.0, non_negative),
            description: self.description.filter(|d| !d.trim().is_empty()),
            image_url,
            consumed_at,
        }
    }
}

fn non_negative(grams: f64) -> f64 {
    if grams.is_finite() { grams.max(0.0) } else { 0.0 }
}

/// Strip a surrounding markdown code fence (```json ... ```) if present
fn strip_code_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the language tag on the opening line
    match rest.find('\n') {
        Some(newline) if !rest[..newline].trim_start().starts_with('{') => rest[newline + 1..].trim(),
        _ => rest.trim(),
    }
}

/// Parse a provider reply into an estimate.
///
/// Non-2xx statuses are classified. A 2xx body that carries an `error` object
/// is classified too, using its `message`.
pub fn parse_provider_reply(status: u16, body: &str) -> Result<MealEstimate, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::classify(status, body));
    }

    let json = strip_code_fence(body);
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::classify(status, &message));
    }

    serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))
}
