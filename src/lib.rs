//! Macro Tracker Library
//!
//! Meal logging, daily totals, streaks and goal metrics behind an MCP server.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
