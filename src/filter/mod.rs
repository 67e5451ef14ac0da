// ABOUTME: Ignore-pattern filtering for file-set reconciliation
// Patterns are regular expressions matched against root-relative, forward-slash paths

pub mod matcher;
pub mod store;

pub use matcher::IgnoreMatcher;
pub use store::{FilterError, IgnoreFile, IgnoreSource, InMemoryIgnoreList, IGNORE_FILE};
