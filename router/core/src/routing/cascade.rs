//! Cascading Router
//!
//! Composes a fast deterministic stage with a slow semantic stage and a
//! guaranteed default:
//!
//! ```text
//! query -> fast stage --hit--> (expert, 1.0, fast latency)
//!              | miss
//!              v
//!          slow stage --hit--> (expert, similarity, fast + slow latency)
//!              | miss
//!              v
//!          fallback ---------> (fallback expert, fixed confidence, fast + slow latency)
//! ```
//!
//! The slow stage never runs when the fast stage decides, and the two
//! stages' results are never combined. The router holds no mutable state;
//! one instance can serve any number of concurrent callers.

use std::sync::Arc;

use super::config::RouterConfig;
use super::decision::{Decision, ExpertId, RoutingDecision, Stage, Timed};
use super::embedding::{Embedder, HashingEmbedder};
use super::error::RouterError;
use super::keyword::KeywordMatcher;
use super::semantic::SemanticMatcher;
use super::strategy::RoutingStrategy;

/// Two-stage cascade with a fallback expert
pub struct CascadingRouter {
    fast: Box<dyn RoutingStrategy>,
    slow: Box<dyn RoutingStrategy>,
    fallback_expert: ExpertId,
    fallback_confidence: f64,
}

impl CascadingRouter {
    /// Compose two stages with a fallback expert
    ///
    /// The fallback confidence starts at
    /// [`DEFAULT_FALLBACK_CONFIDENCE`](super::config::DEFAULT_FALLBACK_CONFIDENCE).
    pub fn new(
        fast: Box<dyn RoutingStrategy>,
        slow: Box<dyn RoutingStrategy>,
        fallback_expert: impl Into<ExpertId>,
    ) -> Self {
        Self {
            fast,
            slow,
            fallback_expert: fallback_expert.into(),
            fallback_confidence: super::config::DEFAULT_FALLBACK_CONFIDENCE,
        }
    }

    /// Set the confidence reported for fallback decisions
    #[must_use]
    pub fn with_fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = confidence;
        self
    }

    /// Build a keyword + semantic cascade with the given encoder
    ///
    /// The configured semantic threshold is injected into the semantic stage.
    pub fn from_config(
        config: &RouterConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RouterError> {
        config.validate()?;

        let keyword = KeywordMatcher::new(&config.experts)?;
        let semantic = SemanticMatcher::new(embedder, &config.experts)?
            .with_threshold(config.semantic_threshold);

        Ok(Self::new(
            Box::new(keyword),
            Box::new(semantic),
            config.fallback_expert.clone(),
        )
        .with_fallback_confidence(config.fallback_confidence))
    }

    /// Build a cascade using the built-in hashing encoder
    pub fn with_hashing_embedder(config: &RouterConfig) -> Result<Self, RouterError> {
        let embedder = HashingEmbedder::new(config.embedding_dim)?;
        Self::from_config(config, Arc::new(embedder))
    }

    /// The expert applied when both stages miss
    #[must_use]
    pub fn fallback_expert(&self) -> &ExpertId {
        &self.fallback_expert
    }

    /// Route a query to an expert
    ///
    /// Only encoder faults in the slow stage produce an error; running out of
    /// stages ends in the fallback expert.
    pub fn route(&self, query: &str) -> Result<RoutingDecision, RouterError> {
        let fast = self.fast.route(query)?;
        if let Some(decision) = Self::accept(&fast, Stage::Keyword, fast.latency_ms()) {
            return Ok(decision);
        }

        let slow = self.slow.route(query)?;
        let total_ms = fast.latency_ms() + slow.latency_ms();
        if let Some(decision) = Self::accept(&slow, Stage::Semantic, total_ms) {
            return Ok(decision);
        }

        Ok(RoutingDecision {
            expert: self.fallback_expert.clone(),
            confidence: self.fallback_confidence,
            latency_ms: total_ms,
            stage: Stage::Fallback,
        })
    }

    /// Turn a stage hit into a final decision
    fn accept(outcome: &Timed<Decision>, stage: Stage, latency_ms: f64) -> Option<RoutingDecision> {
        match &outcome.value {
            Decision::Matched { expert, confidence } => Some(RoutingDecision {
                expert: expert.clone(),
                confidence: *confidence,
                latency_ms,
                stage,
            }),
            Decision::NoMatch { .. } => None,
        }
    }
}

impl std::fmt::Debug for CascadingRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadingRouter")
            .field("fast", &self.fast.name())
            .field("slow", &self.slow.name())
            .field("fallback_expert", &self.fallback_expert)
            .field("fallback_confidence", &self.fallback_confidence)
            .finish()
    }
}

impl RoutingStrategy for CascadingRouter {
    fn name(&self) -> &str {
        "cascade"
    }

    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError> {
        let decision = Self::route(self, query)?;
        let elapsed = std::time::Duration::from_secs_f64(decision.latency_ms / 1000.0);
        Ok(Timed::new(
            Decision::matched(decision.expert, decision.confidence),
            elapsed,
        ))
    }
}
