//! Body measurement unit conversions
//!
//! Weight is stored in kilograms and height in centimeters; these helpers
//! convert to and from the imperial units the presentation layer may show.

use serde::{Deserialize, Serialize};

/// Pounds per kilogram
pub const LBS_PER_KG: f64 = 2.20462;

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

pub const INCHES_PER_FOOT: f64 = 12.0;

/// A height expressed as whole feet plus whole inches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeetInches {
    pub feet: u32,
    pub inches: u32,
}

pub fn kg_to_lbs(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs / LBS_PER_KG
}

pub fn cm_to_inches(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

pub fn inches_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

/// Convert centimeters to feet and inches.
///
/// `feet = floor(total_inches / 12)`, `inches = round(remainder)`. A remainder
/// that rounds up to 12 carries into the next foot, so 182.8 cm is `6'0"`
/// rather than `5'12"`.
pub fn cm_to_feet_inches(cm: f64) -> FeetInches {
    let total_inches = cm_to_inches(cm.max(0.0));
    let mut feet = (total_inches / INCHES_PER_FOOT).floor() as u32;
    let mut inches = (total_inches - feet as f64 * INCHES_PER_FOOT).round() as u32;
    if inches >= 12 {
        feet += 1;
        inches -= 12;
    }
    FeetInches { feet, inches }
}

pub fn feet_inches_to_cm(feet: f64, inches: f64) -> f64 {
    inches_to_cm(feet * INCHES_PER_FOOT + inches)
}

/// Round to one decimal place (weights, projected weekly change)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Direction of a `convert_units` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    KgToLbs,
    LbsToKg,
    CmToFeetInches,
    FeetInchesToCm,
}

impl Conversion {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "kg_to_lbs" | "kg_to_lb" => Some(Conversion::KgToLbs),
            "lbs_to_kg" | "lb_to_kg" => Some(Conversion::LbsToKg),
            "cm_to_feet_inches" | "cm_to_ft_in" => Some(Conversion::CmToFeetInches),
            "feet_inches_to_cm" | "ft_in_to_cm" => Some(Conversion::FeetInchesToCm),
            _ => None,
        }
    }
}
