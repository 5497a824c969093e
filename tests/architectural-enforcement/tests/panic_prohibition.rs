//! Panic Shortcut Prohibition Enforcement
//!
//! Production code propagates errors with `?` and typed errors. `unwrap()`
//! and `expect()` are allowed in tests only.

use architectural_enforcement::{find_patterns, production_lines};

const SOURCE_DIRS: &[&str] = &["router/core/src", "router/cli/src"];

const PANIC_PATTERNS: &[&str] = &[".unwrap()", ".expect(", "unimplemented!", "todo!("];

#[test]
fn test_no_panicking_shortcuts_in_production_code() {
    let mut violations = Vec::new();

    for dir in SOURCE_DIRS {
        let lines = production_lines(dir);
        violations.extend(find_patterns(&lines, PANIC_PATTERNS).into_iter().cloned());
    }

    if !violations.is_empty() {
        eprintln!("\n🚨 PANIC SHORTCUTS FOUND:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!(
            "Panicking shortcuts found: {} lines outside tests",
            violations.len()
        );
    }
}
