// ABOUTME: Compiles ignore pattern strings into regex matchers
// A pattern that fails to compile is dropped with a warning; the rest still apply

use regex::Regex;
use tracing::warn;

/// Compiled ignore patterns.
///
/// Paths passed to [`IgnoreMatcher::should_ignore`] must be in the form the
/// patterns are written against: relative to the workspace root with `/`
/// separators (`src/generated/api.rs`, not `/home/me/proj/src/generated/api.rs`).
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<Regex>,
}

impl IgnoreMatcher {
    pub fn compile<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|pattern| {
                let pattern = pattern.as_ref();
                if pattern.trim().is_empty() {
                    return None;
                }
                match Regex::new(pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        warn!("Dropping invalid ignore pattern {:?}: {}", pattern, e);
                        None
                    }
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn should_ignore(&self, display_path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(display_path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_does_not_abort_others() {
        let matcher = IgnoreMatcher::compile(["(unclosed", r"\.lock$", "node_modules/"]);
        assert_eq!(matcher.len(), 2);
        assert!(matcher.should_ignore("Cargo.lock"));
        assert!(matcher.should_ignore("web/node_modules/react/index.js"));
        assert!(!matcher.should_ignore("src/lib.rs"));
    }

    #[test]
    fn test_empty_matcher_ignores_nothing() {
        let matcher = IgnoreMatcher::compile(Vec::<String>::new());
        assert!(matcher.is_empty());
        assert!(!matcher.should_ignore("anything"));
    }

    #[test]
    fn test_blank_patterns_are_skipped() {
        // An empty regex would match every path
        let matcher = IgnoreMatcher::compile(["", "   "]);
        assert!(matcher.is_empty());
        assert!(!matcher.should_ignore("src/lib.rs"));
    }

    #[test]
    fn test_patterns_match_relative_form_only() {
        let matcher = IgnoreMatcher::compile(["^src/generated/"]);
        assert!(matcher.should_ignore("src/generated/api.rs"));
        assert!(!matcher.should_ignore("/home/me/proj/src/generated/api.rs"));
    }
}
