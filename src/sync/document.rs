// ABOUTME: Editor document model and the editor-visible document set
// Only file-scheme documents are kept; paths are stored normalized

use crate::workspace::normalize_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const FILE_SCHEME: &str = "file";

fn default_scheme() -> String {
    FILE_SCHEME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorDocument {
    pub path: PathBuf,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl EditorDocument {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scheme: default_scheme(),
        }
    }

    pub fn new(path: impl Into<PathBuf>, scheme: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            scheme: scheme.into(),
        }
    }

    /// File-scheme document with an absolute path.
    pub fn is_local_file(&self) -> bool {
        self.scheme == FILE_SCHEME && self.path.is_absolute()
    }
}

/// The editor's currently open file documents, as reported by events.
#[derive(Debug, Clone, Default)]
pub struct OpenDocuments {
    paths: BTreeSet<PathBuf>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, document: &EditorDocument) -> bool {
        document.is_local_file() && self.paths.insert(normalize_path(&document.path))
    }

    pub fn close(&mut self, document: &EditorDocument) -> bool {
        document.is_local_file() && self.paths.remove(&normalize_path(&document.path))
    }

    /// Replace the whole set with `documents`.
    pub fn replace<'a>(&mut self, documents: impl IntoIterator<Item = &'a EditorDocument>) {
        self.paths = documents
            .into_iter()
            .filter(|d| d.is_local_file())
            .map(|d| normalize_path(&d.path))
            .collect();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
