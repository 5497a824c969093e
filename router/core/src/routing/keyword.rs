//! Keyword Matcher
//!
//! The fast path. Each expert owns one compiled, case-insensitive,
//! whole-word pattern; patterns are tried in declaration order and the first
//! hit wins with confidence 1.0. A keyword hit is treated as certain by
//! construction, it is not a measured probability.

use regex::Regex;

use super::config::ExpertRoute;
use super::decision::{timed, Decision, ExpertId, Timed};
use super::error::RouterError;
use super::strategy::{is_blank, RoutingStrategy};

/// Confidence of every keyword hit
pub const KEYWORD_CONFIDENCE: f64 = 1.0;

/// Deterministic pattern-based classifier
#[derive(Clone, Debug)]
pub struct KeywordMatcher {
    /// Compiled patterns in priority order
    patterns: Vec<(ExpertId, Regex)>,
}

impl KeywordMatcher {
    /// Compile the patterns of every route, keeping their order
    pub fn new(routes: &[ExpertRoute]) -> Result<Self, RouterError> {
        if routes.is_empty() {
            return Err(RouterError::config("keyword matcher needs at least one expert"));
        }

        let patterns = routes
            .iter()
            .map(|route| Ok((route.id.clone(), compile_route(route)?)))
            .collect::<Result<Vec<_>, RouterError>>()?;

        Ok(Self { patterns })
    }

    /// Find the first expert whose pattern occurs in the query
    #[must_use]
    pub fn classify(&self, query: &str) -> Decision {
        if is_blank(query) {
            return Decision::no_match(0.0);
        }

        self.patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(query))
            .map_or_else(
                || Decision::no_match(0.0),
                |(expert, _)| Decision::matched(expert.clone(), KEYWORD_CONFIDENCE),
            )
    }

    /// Experts in the order they are checked
    pub fn experts(&self) -> impl Iterator<Item = &ExpertId> {
        self.patterns.iter().map(|(id, _)| id)
    }
}

impl RoutingStrategy for KeywordMatcher {
    fn name(&self) -> &str {
        "keyword"
    }

    fn route(&self, query: &str) -> Result<Timed<Decision>, RouterError> {
        timed(|| Ok(self.classify(query)))
    }
}

/// Build the pattern for one route.
///
/// A raw pattern is used as given (made case-insensitive); otherwise the
/// keywords are escaped and joined into a single word-bounded alternation.
fn compile_route(route: &ExpertRoute) -> Result<Regex, RouterError> {
    let source = match route.pattern.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => format!("(?i){raw}"),
        _ => {
            let alternatives: Vec<String> = route
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(word_bounded)
                .collect();

            if alternatives.is_empty() {
                return Err(RouterError::config(format!(
                    "expert '{}' has no keywords or pattern",
                    route.id
                )));
            }

            format!("(?i)(?:{})", alternatives.join("|"))
        }
    };

    Regex::new(&source).map_err(|source| RouterError::InvalidPattern {
        expert: route.id.to_string(),
        source,
    })
}

/// Escape a keyword and assert word boundaries on its word-character edges
///
/// A boundary next to a symbol would require a word character on the far
/// side, so `c++` at the end of a sentence could never match.
fn word_bounded(keyword: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = if keyword.starts_with(is_word) { r"\b" } else { "" };
    let end = if keyword.ends_with(is_word) { r"\b" } else { "" };
    format!("{start}{}{end}", regex::escape(keyword))
}
