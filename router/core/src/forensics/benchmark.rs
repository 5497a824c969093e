//! Routing Benchmark
//!
//! Runs labelled queries through several strategies side by side and reports
//! latency and accuracy per strategy. Any [`RoutingStrategy`] can be measured,
//! including the cascade itself.

use serde::{Deserialize, Serialize};

use crate::routing::{ExpertId, RoutingStrategy};

/// A query with its expected expert
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    /// Query text
    pub query: String,
    /// Expert a correct router picks
    pub expected: ExpertId,
}

impl BenchmarkCase {
    /// Create a case
    pub fn new(query: impl Into<String>, expected: impl Into<ExpertId>) -> Self {
        Self {
            query: query.into(),
            expected: expected.into(),
        }
    }
}

/// Ground-truth set for the reference professor/zoomer deployment
#[must_use]
pub fn reference_cases() -> Vec<BenchmarkCase> {
    [
        ("calculate the integral of x^2", "professor"),
        ("yo this pizza is bussin", "zoomer"),
        ("class MyObject(object): pass", "professor"),
        ("explain quantum entanglement", "professor"),
        ("no cap that was funny", "zoomer"),
        ("help me structure my backend", "professor"),
        ("i am feeling sad today", "zoomer"),
        ("import numpy as np", "professor"),
        ("bruh", "zoomer"),
        ("what is the capital of france", "professor"),
    ]
    .into_iter()
    .map(|(query, expected)| BenchmarkCase::new(query, expected))
    .collect()
}

/// Results for one strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Strategy name
    pub architecture: String,
    /// Mean latency over successful routes
    pub avg_latency_ms: f64,
    /// 99th percentile latency over successful routes
    pub p99_latency_ms: f64,
    /// Percentage of cases routed to the expected expert
    pub accuracy_pct: f64,
    /// Cases that returned an error
    pub errors: usize,
    /// Total cases run
    pub cases: usize,
}

/// Run every case through every strategy
///
/// A miss (`NoMatch`) and an error both count as incorrect.
pub fn run_benchmark(
    strategies: &[&dyn RoutingStrategy],
    cases: &[BenchmarkCase],
) -> Vec<BenchmarkReport> {
    strategies
        .iter()
        .map(|strategy| run_one(*strategy, cases))
        .collect()
}

fn run_one(strategy: &dyn RoutingStrategy, cases: &[BenchmarkCase]) -> BenchmarkReport {
    let mut latencies = Vec::with_capacity(cases.len());
    let mut correct = 0usize;
    let mut errors = 0usize;

    for case in cases {
        match strategy.route(&case.query) {
            Ok(timed) => {
                latencies.push(timed.latency_ms());
                if timed.value.expert() == Some(&case.expected) {
                    correct += 1;
                }
            }
            Err(e) => {
                tracing::warn!(strategy = strategy.name(), query = %case.query, error = %e, "Benchmark case failed");
                errors += 1;
            }
        }
    }

    let accuracy_pct = if cases.is_empty() {
        0.0
    } else {
        correct as f64 / cases.len() as f64 * 100.0
    };

    BenchmarkReport {
        architecture: strategy.name().to_string(),
        avg_latency_ms: mean(&latencies),
        p99_latency_ms: percentile(&latencies, 99.0),
        accuracy_pct,
        errors,
        cases: cases.len(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks
#[must_use]
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Render reports as a markdown table
#[must_use]
pub fn render_markdown(reports: &[BenchmarkReport]) -> String {
    let mut out = String::from(
        "| Architecture | Avg Latency (ms) | P99 Latency (ms) | Accuracy (%) | Errors |\n\
         |---|---|---|---|---|\n",
    );
    for r in reports {
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.1} | {} |\n",
            r.architecture, r.avg_latency_ms, r.p99_latency_ms, r.accuracy_pct, r.errors
        ));
    }
    out
}
