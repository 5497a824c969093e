//! Routing Configuration
//!
//! Declares the closed set of experts, the keyword vocabulary and example
//! utterances for each, and the cascade settings (semantic threshold,
//! fallback expert, fallback confidence). Declaration order matters: it is
//! the tie-break order of both matchers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::decision::ExpertId;
use super::error::RouterError;

/// Threshold the cascade injects into its semantic stage
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.45;

/// Confidence reported when the fallback expert is applied
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.1;

/// Dimension of the built-in hashing embedder
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

// ============================================================================
// Expert Routes
// ============================================================================

/// Routing data for one expert
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpertRoute {
    /// Expert identifier
    pub id: ExpertId,

    /// Whole-word keywords (matched case-insensitively)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Raw regular expression, used instead of `keywords` when set
    #[serde(default)]
    pub pattern: Option<String>,

    /// Example utterances forming the expert's semantic cluster
    #[serde(default)]
    pub examples: Vec<String>,
}

impl ExpertRoute {
    /// Create an empty route for an expert
    pub fn new(id: impl Into<ExpertId>) -> Self {
        Self {
            id: id.into(),
            keywords: Vec::new(),
            pattern: None,
            examples: Vec::new(),
        }
    }

    /// Set the keyword vocabulary
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set a raw pattern, overriding the keywords
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the example utterances
    #[must_use]
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the route can build a keyword pattern
    #[must_use]
    pub fn has_pattern_data(&self) -> bool {
        self.pattern.as_deref().is_some_and(|p| !p.trim().is_empty())
            || self.keywords.iter().any(|k| !k.trim().is_empty())
    }

    /// Whether the route has at least one usable example
    #[must_use]
    pub fn has_examples(&self) -> bool {
        self.examples.iter().any(|e| !e.trim().is_empty())
    }
}

// ============================================================================
// Router Configuration
// ============================================================================

/// Configuration of the cascading router
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Experts in priority order
    pub experts: Vec<ExpertRoute>,

    /// Expert applied when no stage decides
    pub fallback_expert: ExpertId,

    /// Confidence attached to fallback decisions
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Minimum similarity for the semantic stage to decide
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,

    /// Dimension of the built-in embedder
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

fn default_fallback_confidence() -> f64 {
    DEFAULT_FALLBACK_CONFIDENCE
}

fn default_semantic_threshold() -> f64 {
    DEFAULT_SEMANTIC_THRESHOLD
}

fn default_embedding_dim() -> usize {
    DEFAULT_EMBEDDING_DIM
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl RouterConfig {
    /// Create a configuration with default cascade settings
    pub fn new(experts: Vec<ExpertRoute>, fallback_expert: impl Into<ExpertId>) -> Self {
        Self {
            experts,
            fallback_expert: fallback_expert.into(),
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }

    /// The two-expert reference deployment: a technical "professor" and a
    /// casual "zoomer", falling back to the professor.
    ///
    /// The example clusters must not contain the labelled benchmark queries;
    /// the hashing encoder only recalls queries that share vocabulary with an
    /// example.
    #[must_use]
    pub fn reference() -> Self {
        let professor = ExpertRoute::new("professor")
            .with_keywords([
                "def", "class", "import", "math", "derivative", "quantum", "code", "debug",
                "function", "api", "compiler",
            ])
            .with_examples([
                "explain the quantum physics of light",
                "debug this python stack trace",
                "what is the derivative of log x",
                "architectural patterns for microservices",
                "mathematical proof of concept",
                "software engineering best practices",
                "designing scalable backends and api layers",
                "solving calculus problems with integrals",
                "optimize a slow database query",
                "organizing a large codebase into modules",
                "restructuring legacy server code",
            ]);

        let zoomer = ExpertRoute::new("zoomer")
            .with_keywords([
                "yo", "lol", "vibes", "cap", "bet", "finna", "bruh", "meme", "joke", "lit", "fam",
            ])
            .with_examples([
                "yo what is up",
                "tell me a joke bro",
                "write a tweet about pizza",
                "vibes are off today",
                "explain like i am 5",
                "that movie was mid no cap",
                "rate my outfit",
                "what song should i vibe to",
                "my feelings are hurt and i need a hug",
                "bored at home send memes",
                "late night snack ideas",
            ]);

        Self::new(vec![professor, zoomer], "professor")
    }

    /// Set the semantic threshold
    #[must_use]
    pub fn with_semantic_threshold(mut self, threshold: f64) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    /// Set the fallback confidence
    #[must_use]
    pub fn with_fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = confidence;
        self
    }

    /// Set the embedding dimension
    #[must_use]
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Look up an expert route by id
    #[must_use]
    pub fn expert(&self, id: &str) -> Option<&ExpertRoute> {
        self.experts.iter().find(|e| e.id.as_str() == id)
    }

    /// Expert ids in declaration order
    pub fn expert_ids(&self) -> impl Iterator<Item = &ExpertId> {
        self.experts.iter().map(|e| &e.id)
    }

    /// Check that a router can be built from this configuration
    ///
    /// Every declared expert needs pattern data and at least one example,
    /// ids must be unique and non-empty, and the fallback must be declared.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.experts.is_empty() {
            return Err(RouterError::config("no experts declared"));
        }

        let mut seen = HashSet::new();
        for route in &self.experts {
            if route.id.as_str().trim().is_empty() {
                return Err(RouterError::config("expert id must not be empty"));
            }
            if !seen.insert(route.id.as_str()) {
                return Err(RouterError::config(format!(
                    "expert '{}' declared more than once",
                    route.id
                )));
            }
            if !route.has_pattern_data() {
                return Err(RouterError::config(format!(
                    "expert '{}' has no keywords or pattern",
                    route.id
                )));
            }
            if !route.has_examples() {
                return Err(RouterError::config(format!(
                    "expert '{}' has no example utterances",
                    route.id
                )));
            }
        }

        if !seen.contains(self.fallback_expert.as_str()) {
            return Err(RouterError::config(format!(
                "fallback expert '{}' is not a declared expert",
                self.fallback_expert
            )));
        }

        if !(0.0..=1.0).contains(&self.fallback_confidence) {
            return Err(RouterError::config(format!(
                "fallback confidence {} is outside [0, 1]",
                self.fallback_confidence
            )));
        }

        if !(-1.0..=1.0).contains(&self.semantic_threshold) {
            return Err(RouterError::config(format!(
                "semantic threshold {} is outside [-1, 1]",
                self.semantic_threshold
            )));
        }

        if self.embedding_dim == 0 {
            return Err(RouterError::config("embedding dimension must be positive"));
        }

        Ok(())
    }
}
