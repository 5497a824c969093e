//! Expert Query Routing
//!
//! Chooses the downstream expert for a query by topical fit.
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! |  CascadingRouter   |  <-- Only entry point for callers
//! +---------+----------+
//!           |
//!           v
//! +--------------------+   hit
//! |   KeywordMatcher   | -------> (expert, 1.0)
//! +---------+----------+
//!           | miss
//!           v
//! +--------------------+   hit
//! |  SemanticMatcher   | -------> (expert, similarity)
//! +---------+----------+
//!           | miss
//!           v
//!      fallback expert ---------> (fallback, fixed confidence)
//! ```
//!
//! # Design Principles
//!
//! 1. **Fast path first**: the semantic stage runs only on a keyword miss
//! 2. **No leaking sentinels**: a miss is [`Decision::NoMatch`], never an expert id
//! 3. **Read-only after construction**: every component is `Send + Sync`
//! 4. **No side effects**: logging and persistence belong to callers

pub mod cascade;
pub mod config;
pub mod decision;
pub mod embedding;
pub mod error;
pub mod keyword;
pub mod semantic;
pub mod strategy;

pub use cascade::CascadingRouter;
pub use config::{ExpertRoute, RouterConfig};
pub use decision::{timed, Decision, ExpertId, RoutingDecision, Stage, Timed};
pub use embedding::{cosine_similarity, Embedder, HashingEmbedder};
pub use error::{EmbeddingError, RouterError};
pub use keyword::KeywordMatcher;
pub use semantic::{RouteExampleIndex, SemanticMatcher};
pub use strategy::RoutingStrategy;
