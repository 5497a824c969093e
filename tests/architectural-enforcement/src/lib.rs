//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The routing core stays pure (no I/O, no logging, no runtime)
//! - No blocking I/O inside async functions
//! - No panicking shortcuts in production code
//!
//! The helpers below turn a source tree into annotated code lines so each
//! check can stay a short list of forbidden patterns.

use std::fs;
use std::path::{Path, PathBuf};

/// Repository root, resolved from this package's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// One line of production code
#[derive(Clone, Debug)]
pub struct CodeLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Line with any trailing `//` comment removed
    pub code: String,
    /// Whether the nearest enclosing function is `async`
    pub in_async_fn: bool,
}

impl std::fmt::Display for CodeLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// Classify a line as a function signature
///
/// Returns `Some(is_async)` when the line opens a function, after any
/// visibility and qualifier keywords.
#[must_use]
pub fn fn_signature(line: &str) -> Option<bool> {
    let mut is_async = false;
    for word in line.split_whitespace() {
        match word {
            "fn" => return Some(is_async),
            "async" => is_async = true,
            "pub" | "const" | "unsafe" | "extern" => {}
            w if w.starts_with("pub(") => {}
            _ => return None,
        }
    }
    None
}

/// Code portion of a line, without comments
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Production lines of a single source text
///
/// Everything from the first `#[cfg(test)]` on is treated as test code.
#[must_use]
pub fn production_lines_of(path: &Path, content: &str) -> Vec<CodeLine> {
    let mut lines = Vec::new();
    let mut in_async_fn = false;

    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        if let Some(is_async) = fn_signature(trimmed) {
            in_async_fn = is_async;
        }

        lines.push(CodeLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code: strip_comment(raw).to_string(),
            in_async_fn,
        });
    }

    lines
}

/// Production lines of every `.rs` file under a workspace-relative directory
///
/// Panics if the directory does not exist, so a moved crate cannot turn a
/// check into a silent pass.
#[must_use]
pub fn production_lines(relative_dir: &str) -> Vec<CodeLine> {
    let dir = workspace_root().join(relative_dir);
    assert!(dir.is_dir(), "source directory not found: {}", dir.display());

    let mut lines = Vec::new();
    for entry in walkdir::WalkDir::new(&dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
    {
        if let Ok(content) = fs::read_to_string(entry.path()) {
            lines.extend(production_lines_of(entry.path(), &content));
        }
    }
    lines
}

/// Lines containing any of the given patterns
#[must_use]
pub fn find_patterns<'a>(lines: &'a [CodeLine], patterns: &[&str]) -> Vec<&'a CodeLine> {
    lines
        .iter()
        .filter(|line| patterns.iter().any(|p| line.code.contains(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_signature_detection() {
        assert_eq!(fn_signature("fn main() {"), Some(false));
        assert_eq!(fn_signature("pub fn route(&self) -> Decision {"), Some(false));
        assert_eq!(fn_signature("pub(crate) async fn open(path: &Path) {"), Some(true));
        assert_eq!(fn_signature("async fn send(&self) {"), Some(true));
        assert_eq!(fn_signature("let f = |x| x + 1;"), None);
        assert_eq!(fn_signature("impl Foo {"), None);
    }

    #[test]
    fn test_test_modules_are_excluded() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() { std::fs::read(\"x\"); }\n}\n";
        let lines = production_lines_of(Path::new("x.rs"), source);
        assert_eq!(lines.len(), 1);
        assert!(find_patterns(&lines, &["std::fs"]).is_empty());
    }

    #[test]
    fn test_async_context_tracking() {
        let source = "async fn bad() {\n    std::fs::read(\"f\");\n}\nfn ok() {\n    std::fs::read(\"f\");\n}\n";
        let lines = production_lines_of(Path::new("x.rs"), source);
        let hits = find_patterns(&lines, &["std::fs::"]);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].in_async_fn);
        assert!(!hits[1].in_async_fn);
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "//! Uses tokio::fs\nfn a() {} // tracing::info!\n";
        let lines = production_lines_of(Path::new("x.rs"), source);
        assert!(find_patterns(&lines, &["tokio::", "tracing::"]).is_empty());
    }
}
