//! Blocking I/O Prohibition Enforcement
//!
//! Async functions run on the tokio runtime and must not block it.
//! Inside an `async fn` the following are forbidden:
//! - `std::fs::*` (use `tokio::fs::*`)
//! - `std::net::*` (use `tokio::net::*`)
//! - `std::process::Command` (use `tokio::process::Command`)
//! - `std::thread::sleep` (use `tokio::time::sleep`)
//! - `reqwest::blocking` (use async `reqwest`)
//!
//! Synchronous functions may use blocking calls. Configuration loading runs
//! once before any request is served and reads its file with `std::fs`.

use architectural_enforcement::{find_patterns, production_lines, CodeLine};

const SOURCE_DIRS: &[&str] = &["router/core/src", "router/cli/src"];

const BLOCKING_PATTERNS: &[&str] = &[
    "std::fs::",
    "std::net::",
    "std::process::Command",
    "std::thread::sleep",
    "reqwest::blocking",
];

fn blocking_calls_in_async(lines: &[CodeLine]) -> Vec<&CodeLine> {
    find_patterns(lines, BLOCKING_PATTERNS)
        .into_iter()
        .filter(|line| line.in_async_fn)
        .collect()
}

#[test]
fn test_no_blocking_io_in_async_functions() {
    let mut violations = Vec::new();

    for dir in SOURCE_DIRS {
        let lines = production_lines(dir);
        violations.extend(blocking_calls_in_async(&lines).into_iter().cloned());
    }

    if !violations.is_empty() {
        eprintln!("\n🚨 BLOCKING I/O VIOLATIONS FOUND:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\n❌ Found {} violations", violations.len());
        eprintln!("\n📖 Use tokio::fs, tokio::net, tokio::process or tokio::time instead.\n");
        panic!(
            "Blocking I/O violations found: {} violations in async code",
            violations.len()
        );
    }
}

#[test]
fn test_detector_flags_blocking_call_in_async_fn() {
    let source = r#"
pub async fn load(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}
"#;
    let lines = architectural_enforcement::production_lines_of(std::path::Path::new("t.rs"), source);
    assert_eq!(blocking_calls_in_async(&lines).len(), 1);
}

#[test]
fn test_detector_allows_blocking_call_in_sync_fn() {
    let source = r#"
pub fn load(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

async fn save(path: &Path) {
    tokio::fs::write(path, b"x").await.ok();
}
"#;
    let lines = architectural_enforcement::production_lines_of(std::path::Path::new("t.rs"), source);
    assert!(blocking_calls_in_async(&lines).is_empty());
}
