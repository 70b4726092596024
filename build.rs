//! Build stamping for macrotrack
//!
//! Keeps a running build counter in `build_number.txt` and hands the counter,
//! a UTC timestamp and the cargo profile to the crate as compile-time env vars.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn next_build_number(counter: &Path) -> u64 {
    let previous = fs::read_to_string(counter)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let next = previous + 1;

    // A read-only checkout still builds, it just stops counting
    if let Err(e) = fs::write(counter, next.to_string()) {
        println!("cargo:warning=could not update {}: {}", COUNTER_FILE, e);
    }
    next
}

fn main() {
    // Only source edits bump the counter
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");

    let build = next_build_number(Path::new(COUNTER_FILE));
    let stamped_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("MACROTRACK_BUILD_NUMBER", build.to_string()),
        ("MACROTRACK_BUILD_TIMESTAMP", stamped_at.clone()),
        ("MACROTRACK_BUILD_PROFILE", profile.clone()),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }

    println!("cargo:warning=macrotrack build #{} ({}) at {}", build, profile, stamped_at);
}
