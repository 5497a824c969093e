//! Routing Strategy Contract
//!
//! Every classifier (keyword, semantic, cascading) implements
//! [`RoutingStrategy`]. Callers depend only on this trait, which keeps the
//! matchers independently testable and lets the cascade compose them.

use super::decision::{Decision, Timed};
use super::error::RouterError;

/// A query classifier producing a timed [`Decision`]
///
/// Implementations must be safe to share across threads: routing state is
/// built once and only read afterwards.
pub trait RoutingStrategy: Send + Sync {
    /// Short name used in reports (e.g. "keyword")
    fn name(&self) -> &str;

    /// Classify a query
    ///
    /// Returns `Decision::NoMatch` when the strategy cannot decide. An `Err`
    /// is reserved for faults (e.g. an unavailable encoder), never for
    /// uncertainty.
    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError>;
}

impl<S: RoutingStrategy + ?Sized> RoutingStrategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError> {
        (**self).route(query)
    }
}

impl<S: RoutingStrategy + ?Sized> RoutingStrategy for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError> {
        (**self).route(query)
    }
}

/// Whether a query carries no content to classify
pub(crate) fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}
