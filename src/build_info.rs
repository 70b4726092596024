//! Build metadata
//!
//! Values stamped by `build.rs`, shown in the startup banner and returned by
//! the status tool. Builds without the stamp (e.g. rust-analyzer) report build
//! 0 and "unknown".

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

const STAMP_MISSING: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    /// Cargo profile, `debug` or `release`
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: parse_build_number(option_env!("MACROTRACK_BUILD_NUMBER")),
            build_timestamp: option_env!("MACROTRACK_BUILD_TIMESTAMP").unwrap_or(STAMP_MISSING),
            build_profile: option_env!("MACROTRACK_BUILD_PROFILE").unwrap_or(STAMP_MISSING),
        }
    }

    /// One-line identifier, e.g. `macrotrack 1.0.0 (build 42, release)`
    pub fn label(&self) -> String {
        format!(
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_profile
        )
    }
}

fn parse_build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Print the startup banner to stderr (stdout belongs to the MCP transport)
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("-----------------------------------------------");
    eprintln!(" Macro Tracker  {}", info.label());
    eprintln!(" stamped {}", info.build_timestamp);
    eprintln!("-----------------------------------------------");
}
