// ABOUTME: Workspace root discovery and path membership checks
// Resolves the version-control root and formats paths relative to it

pub mod resolver;

pub use resolver::{normalize_path, PathResolver, RootKind, WorkspaceRoot};
