//! Data models
//!
//! Rust structs representing database entities.

mod entry;
mod goals;
mod nutrition;
mod user;

pub use entry::{NutritionEntry, NutritionEntryCreate, NutritionEntryUpdate};
pub use goals::UserGoals;
pub use nutrition::Macros;
pub use user::User;
