// ABOUTME: PathResolver walks upward from a start directory to find the workspace root
// Membership checks and display formatting are computed against that root

use path_clean::PathClean;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directory whose presence marks a version-control root.
pub const VCS_MARKER: &str = ".git";

/// Files whose presence marks a project root when no repository is found.
pub const PROJECT_MARKERS: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml"];

/// How a workspace root was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RootKind {
    VersionControl,
    Project,
    StartDirectory,
}

/// The base directory all relative paths and membership checks use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceRoot {
    path: PathBuf,
    kind: RootKind,
}

impl WorkspaceRoot {
    pub fn new(path: impl AsRef<Path>, kind: RootKind) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn contains(&self, path: &Path) -> bool {
        is_workspace_file(path, &self.path)
    }

    pub fn display_path(&self, path: &Path) -> String {
        to_display_path(path, &self.path)
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    vcs_marker: String,
    project_markers: Vec<String>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver {
    pub fn new() -> Self {
        Self::with_markers(VCS_MARKER, PROJECT_MARKERS)
    }

    pub fn with_markers(vcs_marker: &str, project_markers: &[&str]) -> Self {
        Self {
            vcs_marker: vcs_marker.to_string(),
            project_markers: project_markers.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// Resolve the root used for relativizing paths sent to the assistant.
    ///
    /// Prefers the nearest ancestor holding the version-control marker
    /// directory, then the nearest ancestor holding a project descriptor,
    /// then `start_dir` itself. Levels that cannot be inspected count as
    /// having no marker.
    pub fn resolve_root(&self, start_dir: &Path) -> WorkspaceRoot {
        let start = normalize_path(start_dir);

        if let Some(dir) = find_upward(&start, |dir| self.has_vcs_marker(dir)) {
            debug!("Resolved version-control root {}", dir.display());
            return WorkspaceRoot::new(dir, RootKind::VersionControl);
        }

        if let Some(dir) = find_upward(&start, |dir| self.has_project_marker(dir)) {
            debug!("Resolved project root {}", dir.display());
            return WorkspaceRoot::new(dir, RootKind::Project);
        }

        debug!("No root marker above {}, using it as the root", start.display());
        WorkspaceRoot::new(start, RootKind::StartDirectory)
    }

    /// Nearest ancestor with either kind of marker, used as the process
    /// working directory. Falls back to `start_dir`.
    pub fn resolve_project_dir(&self, start_dir: &Path) -> PathBuf {
        let start = normalize_path(start_dir);
        find_upward(&start, |dir| self.has_vcs_marker(dir) || self.has_project_marker(dir))
            .unwrap_or(start)
    }

    fn has_vcs_marker(&self, dir: &Path) -> bool {
        std::fs::metadata(dir.join(&self.vcs_marker))
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    fn has_project_marker(&self, dir: &Path) -> bool {
        self.project_markers.iter().any(|marker| {
            std::fs::metadata(dir.join(marker))
                .map(|meta| meta.is_file())
                .unwrap_or(false)
        })
    }
}

fn find_upward(start: &Path, mut has_marker: impl FnMut(&Path) -> bool) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| has_marker(dir))
        .map(Path::to_path_buf)
}

/// Lexically normalize a path: `.` segments dropped, `..` folded.
/// Identity comparisons always go through this.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.to_path_buf().clean()
}

/// True iff `path` is `root` or lies beneath it. Comparison is per
/// component, so `/a/bc/file` is not inside `/a/b`.
pub fn is_workspace_file(path: &Path, root: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// Root-relative path with forward slashes. Paths outside the root get
/// leading `..` segments.
pub fn to_display_path(path: &Path, root: &Path) -> String {
    let path = normalize_path(path);
    let root = normalize_path(root);

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let root_parts: Vec<Component<'_>> = root.components().collect();

    let common = path_parts
        .iter()
        .zip(root_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..root_parts.len() {
        segments.push("..".to_string());
    }
    for part in &path_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().replace('\\', "/"));
    }

    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}
