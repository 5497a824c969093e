//! Semantic Matcher
//!
//! The slow, high-recall path. Example utterances for each expert are
//! embedded once when the [`RouteExampleIndex`] is built; a query is embedded
//! per call and scored against each expert by its best (maximum) cosine
//! similarity to that expert's examples.
//!
//! # Scoring
//!
//! ```text
//! score(expert) = max over examples e of cos(embed(query), e)
//! best          = argmax over experts (first declared wins ties)
//! decision      = Matched(best)   if score(best) >= threshold
//!                 NoMatch(score)  otherwise
//! ```

use std::sync::Arc;

use super::config::ExpertRoute;
use super::decision::{timed, Decision, ExpertId, Timed};
use super::embedding::{cosine_similarity, Embedder};
use super::error::{EmbeddingError, RouterError};
use super::strategy::{is_blank, RoutingStrategy};

/// Threshold of a matcher built without explicit configuration
pub const DEFAULT_MATCHER_THRESHOLD: f64 = 0.0;

// ============================================================================
// Example Index
// ============================================================================

/// Precomputed example embeddings for one expert
#[derive(Clone, Debug)]
struct ExampleCluster {
    expert: ExpertId,
    utterances: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

/// Embedded example utterances per expert, in declaration order
#[derive(Clone, Debug)]
pub struct RouteExampleIndex {
    clusters: Vec<ExampleCluster>,
    dimension: usize,
}

impl RouteExampleIndex {
    /// Embed every route's examples
    ///
    /// Fails if a route has no examples or the encoder cannot embed them.
    pub fn build(embedder: &dyn Embedder, routes: &[ExpertRoute]) -> Result<Self, RouterError> {
        if routes.is_empty() {
            return Err(RouterError::config("semantic index needs at least one expert"));
        }

        let dimension = embedder.dimension();
        let mut clusters = Vec::with_capacity(routes.len());

        for route in routes {
            let utterances: Vec<String> = route
                .examples
                .iter()
                .filter(|e| !e.trim().is_empty())
                .cloned()
                .collect();

            if utterances.is_empty() {
                return Err(RouterError::config(format!(
                    "expert '{}' has no example utterances",
                    route.id
                )));
            }

            let embeddings = embedder.embed_batch(&utterances)?;
            if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: bad.len(),
                }
                .into());
            }

            clusters.push(ExampleCluster {
                expert: route.id.clone(),
                utterances,
                embeddings,
            });
        }

        Ok(Self {
            clusters,
            dimension,
        })
    }

    /// Dimension of the stored embeddings
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Experts in declaration order
    pub fn experts(&self) -> impl Iterator<Item = &ExpertId> {
        self.clusters.iter().map(|c| &c.expert)
    }

    /// Example utterances of one expert
    #[must_use]
    pub fn examples(&self, expert: &str) -> Option<&[String]> {
        self.clusters
            .iter()
            .find(|c| c.expert.as_str() == expert)
            .map(|c| c.utterances.as_slice())
    }

    /// Max-over-examples similarity of a query vector, per expert
    #[must_use]
    pub fn scores(&self, query: &[f32]) -> Vec<(&ExpertId, f64)> {
        self.clusters
            .iter()
            .map(|cluster| {
                let best = cluster
                    .embeddings
                    .iter()
                    .map(|example| cosine_similarity(query, example))
                    .fold(f64::NEG_INFINITY, f64::max);
                (&cluster.expert, best)
            })
            .collect()
    }
}

// ============================================================================
// Semantic Matcher
// ============================================================================

/// Embedding-similarity classifier
pub struct SemanticMatcher {
    embedder: Arc<dyn Embedder>,
    index: RouteExampleIndex,
    threshold: f64,
}

impl SemanticMatcher {
    /// Build the example index with the default threshold (0.0)
    pub fn new(embedder: Arc<dyn Embedder>, routes: &[ExpertRoute]) -> Result<Self, RouterError> {
        let index = RouteExampleIndex::build(embedder.as_ref(), routes)?;
        Ok(Self {
            embedder,
            index,
            threshold: DEFAULT_MATCHER_THRESHOLD,
        })
    }

    /// Replace the decision threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Current decision threshold
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The precomputed example index
    #[must_use]
    pub fn index(&self) -> &RouteExampleIndex {
        &self.index
    }

    /// Embed the query and pick the expert with the best example similarity
    pub fn classify(&self, query: &str) -> Result<Decision, RouterError> {
        if is_blank(query) {
            return Ok(Decision::no_match(0.0));
        }

        let embedding = self.embedder.embed(query)?;
        if embedding.len() != self.index.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: embedding.len(),
            }
            .into());
        }

        // Strict comparison keeps the first declared expert on ties
        let mut best: Option<(&ExpertId, f64)> = None;
        for (expert, score) in self.index.scores(&embedding) {
            let better = match best {
                None => true,
                Some((_, top)) => score > top,
            };
            if better {
                best = Some((expert, score));
            }
        }

        let Some((expert, score)) = best else {
            return Ok(Decision::no_match(0.0));
        };

        if score < self.threshold {
            Ok(Decision::no_match(score))
        } else {
            Ok(Decision::matched(expert.clone(), score))
        }
    }
}

impl std::fmt::Debug for SemanticMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticMatcher")
            .field("dimension", &self.index.dimension())
            .field("experts", &self.index.experts().collect::<Vec<_>>())
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl RoutingStrategy for SemanticMatcher {
    fn name(&self) -> &str {
        "semantic"
    }

    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError> {
        timed(|| self.classify(query))
    }
}
