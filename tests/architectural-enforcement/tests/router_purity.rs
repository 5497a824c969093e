//! Routing Purity Enforcement
//!
//! The routing module decides, it does not act. Everything under
//! `router/core/src/routing` must stay synchronous and free of I/O so that
//! decisions are deterministic and the module can be embedded anywhere.
//!
//! Forbidden in routing production code:
//! - `tracing` (callers log decisions, the router returns them)
//! - `tokio` and `reqwest` (no runtime, no network)
//! - `std::fs`, `std::net`, `std::process` (no side effects)
//! - printing to stdout or stderr

use architectural_enforcement::{find_patterns, production_lines};

const ROUTING_DIR: &str = "router/core/src/routing";

const FORBIDDEN: &[&str] = &[
    "tracing::",
    "use tracing",
    "tokio::",
    "use tokio",
    "reqwest::",
    "std::fs",
    "std::net",
    "std::process",
    "println!",
    "eprintln!",
    "print!(",
    "dbg!(",
];

#[test]
fn test_routing_module_is_pure() {
    let lines = production_lines(ROUTING_DIR);
    assert!(!lines.is_empty(), "no routing sources found");

    let violations = find_patterns(&lines, FORBIDDEN);

    if !violations.is_empty() {
        eprintln!("\n🚨 ROUTING PURITY VIOLATIONS FOUND:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\n❌ Found {} violations", violations.len());
        eprintln!("\n📖 Routing returns decisions; logging and I/O belong to the caller.\n");
        panic!(
            "Routing purity violations found: {} violations",
            violations.len()
        );
    }
}

#[test]
fn test_routing_module_has_no_async_functions() {
    let lines = production_lines(ROUTING_DIR);

    let violations: Vec<_> = lines.iter().filter(|line| line.in_async_fn).collect();

    if !violations.is_empty() {
        eprintln!("\n🚨 ASYNC CODE IN ROUTING:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!("Routing must stay synchronous: {} lines", violations.len());
    }
}
