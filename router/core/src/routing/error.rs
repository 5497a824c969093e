//! Routing Errors
//!
//! Two kinds of failure can leave the routing core: a configuration that
//! cannot produce a usable router (caught at construction), and an encoder
//! that cannot embed a query (surfaced per call). Exhausting every stage is
//! not an error; it ends in the fallback expert.

use thiserror::Error;

/// Failures raised by an [`Embedder`](super::embedding::Embedder)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// The encoder (model weights, remote service, ...) cannot run
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    /// The encoder produced a vector of the wrong size
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the reference index
        expected: usize,
        /// Dimension of the produced vector
        actual: usize,
    },

    /// The encoder refused the input
    #[error("Embedding rejected input: {0}")]
    Rejected(String),
}

/// Errors surfaced by routing strategies and their construction
#[derive(Debug, Error)]
pub enum RouterError {
    /// Missing, empty or contradictory routing data
    #[error("Invalid routing configuration: {0}")]
    Config(String),

    /// A keyword pattern failed to compile
    #[error("Invalid pattern for expert '{expert}': {source}")]
    InvalidPattern {
        /// Expert the pattern belongs to
        expert: String,
        /// Underlying regex error
        source: regex::Error,
    },

    /// The semantic stage could not embed the query or its examples
    #[error("Semantic stage failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl RouterError {
    /// Shorthand for a configuration error
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error originates in the encoder rather than in configuration
    #[must_use]
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }
}
