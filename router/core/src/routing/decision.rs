//! Routing Decision Types
//!
//! Value types shared by every routing strategy. A strategy reports a
//! [`Decision`], which is either a matched expert or an explicit miss. The
//! miss is its own variant, so it can never be mistaken for a routable
//! expert. Only the cascading router produces a [`RoutingDecision`], which
//! always names a real expert.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// ============================================================================
// Expert Identifier
// ============================================================================

/// Opaque identifier of a downstream expert (model + system prompt pair)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpertId(String);

impl ExpertId {
    /// Create an expert identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpertId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ExpertId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ExpertId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Stage Decision
// ============================================================================

/// Outcome of a single routing strategy
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// The strategy selected an expert
    Matched {
        /// Selected expert
        expert: ExpertId,
        /// Confidence attached by the strategy
        confidence: f64,
    },
    /// The strategy could not decide; `confidence` carries the near-miss score
    NoMatch {
        /// Best score observed, for inspection only
        confidence: f64,
    },
}

impl Decision {
    /// Create a matched decision
    pub fn matched(expert: impl Into<ExpertId>, confidence: f64) -> Self {
        Self::Matched {
            expert: expert.into(),
            confidence,
        }
    }

    /// Create a miss carrying the observed score
    #[must_use]
    pub fn no_match(confidence: f64) -> Self {
        Self::NoMatch { confidence }
    }

    /// The selected expert, if any
    #[must_use]
    pub fn expert(&self) -> Option<&ExpertId> {
        match self {
            Self::Matched { expert, .. } => Some(expert),
            Self::NoMatch { .. } => None,
        }
    }

    /// Confidence of the decision (or the near-miss score)
    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Matched { confidence, .. } | Self::NoMatch { confidence } => *confidence,
        }
    }

    /// Whether the strategy selected an expert
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

// ============================================================================
// Timing
// ============================================================================

/// A value paired with the wall-clock time spent producing it
#[derive(Clone, Debug, PartialEq)]
pub struct Timed<T> {
    /// The produced value
    pub value: T,
    /// Time spent producing it
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    /// Pair a value with an explicit duration
    pub fn new(value: T, elapsed: Duration) -> Self {
        Self { value, elapsed }
    }

    /// Elapsed time in fractional milliseconds
    #[must_use]
    pub fn latency_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Discard the timing
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Run `f` and record how long it took.
///
/// Every stage goes through this wrapper so latency is measured the same
/// way everywhere. Errors are passed through untimed.
pub fn timed<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<Timed<T>, E> {
    let start = Instant::now();
    let value = f()?;
    Ok(Timed::new(value, start.elapsed()))
}

// ============================================================================
// Cascade Decision
// ============================================================================

/// Cascade state in which a routing call terminated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Deterministic keyword match on the fast path
    Keyword,
    /// Semantic similarity match on the slow path
    Semantic,
    /// Neither stage decided; the configured default was applied
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Semantic => write!(f, "semantic"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Final decision returned to callers of the cascading router
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Expert to dispatch to
    pub expert: ExpertId,
    /// Confidence in [0, 1] (raw similarity on the semantic path)
    pub confidence: f64,
    /// Sum of the latencies of the stages that ran
    pub latency_ms: f64,
    /// Stage that produced the decision
    pub stage: Stage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_accessors() {
        let hit = Decision::matched("professor", 1.0);
        assert!(hit.is_match());
        assert_eq!(hit.expert().map(ExpertId::as_str), Some("professor"));
        assert!((hit.confidence() - 1.0).abs() < f64::EPSILON);

        let miss = Decision::no_match(0.31);
        assert!(!miss.is_match());
        assert!(miss.expert().is_none());
        assert!((miss.confidence() - 0.31).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timed_measures_and_passes_errors() {
        let ok: Result<Timed<u8>, ()> = timed(|| Ok(7));
        let ok = ok.unwrap();
        assert_eq!(ok.value, 7);
        assert!(ok.latency_ms() >= 0.0);

        let err: Result<Timed<u8>, &str> = timed(|| Err("boom"));
        assert_eq!(err.unwrap_err(), "boom");
    }

    #[test]
    fn test_latency_ms_conversion() {
        let t = Timed::new((), Duration::from_micros(1500));
        assert!((t.latency_ms() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_expert_id_serializes_as_plain_string() {
        let id = ExpertId::new("zoomer");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"zoomer\"");
        assert_eq!(id.to_string(), "zoomer");
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(Stage::Semantic.to_string(), "semantic");
    }
}
