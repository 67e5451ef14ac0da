// ABOUTME: Persistence for the project's ignore list
// A newline-separated list of patterns under the workspace root; missing means empty

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Location of the ignore list, relative to the workspace root.
pub const IGNORE_FILE: &str = ".aider-bridge/ignore";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Failed to read ignore list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write ignore list {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No workspace root to store ignore patterns under")]
    NoRoot,
}

/// Where the mutable ignore list lives.
pub trait IgnoreSource: Send {
    fn load(&self, root: &Path) -> Result<Vec<String>, FilterError>;
    fn append(&mut self, root: &Path, pattern: &str) -> Result<(), FilterError>;
    /// Remove every occurrence of `pattern`; true if any was present.
    fn remove(&mut self, root: &Path, pattern: &str) -> Result<bool, FilterError>;
}

#[derive(Debug, Clone)]
pub struct IgnoreFile {
    relative_path: PathBuf,
}

impl Default for IgnoreFile {
    fn default() -> Self {
        Self::new(IGNORE_FILE)
    }
}

impl IgnoreFile {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }

    pub fn path_for(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }

    fn write_all(&self, root: &Path, patterns: &[String]) -> Result<(), FilterError> {
        let path = self.path_for(root);
        let write_err = |source| FilterError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut content = patterns.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        std::fs::write(&path, content).map_err(write_err)
    }
}

/// Parse the file format: one pattern per line, blank lines and `#` comments skipped.
pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

impl IgnoreSource for IgnoreFile {
    fn load(&self, root: &Path) -> Result<Vec<String>, FilterError> {
        let path = self.path_for(root);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(parse_patterns(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No ignore list at {}", path.display());
                Ok(Vec::new())
            }
            Err(source) => Err(FilterError::Read { path, source }),
        }
    }

    fn append(&mut self, root: &Path, pattern: &str) -> Result<(), FilterError> {
        let mut patterns = self.load(root)?;
        patterns.push(pattern.to_string());
        self.write_all(root, &patterns)?;
        info!("Added ignore pattern {:?}", pattern);
        Ok(())
    }

    fn remove(&mut self, root: &Path, pattern: &str) -> Result<bool, FilterError> {
        let mut patterns = self.load(root)?;
        let before = patterns.len();
        patterns.retain(|p| p != pattern);
        if patterns.len() == before {
            return Ok(false);
        }
        self.write_all(root, &patterns)?;
        info!("Removed ignore pattern {:?}", pattern);
        Ok(true)
    }
}

/// Ignore list kept in memory, shared by every root.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIgnoreList {
    patterns: Vec<String>,
}

impl InMemoryIgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

impl IgnoreSource for InMemoryIgnoreList {
    fn load(&self, _root: &Path) -> Result<Vec<String>, FilterError> {
        Ok(self.patterns.clone())
    }

    fn append(&mut self, _root: &Path, pattern: &str) -> Result<(), FilterError> {
        self.patterns.push(pattern.to_string());
        Ok(())
    }

    fn remove(&mut self, _root: &Path, pattern: &str) -> Result<bool, FilterError> {
        let before = self.patterns.len();
        self.patterns.retain(|p| p != pattern);
        Ok(self.patterns.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(IgnoreFile::default().load(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_remove_rewrite_file() {
        let temp = TempDir::new().unwrap();
        let mut store = IgnoreFile::default();

        store.append(temp.path(), r"\.lock$").unwrap();
        store.append(temp.path(), "^dist/").unwrap();
        store.append(temp.path(), r"\.lock$").unwrap();
        assert_eq!(
            store.load(temp.path()).unwrap(),
            vec![r"\.lock$".to_string(), "^dist/".to_string(), r"\.lock$".to_string()]
        );

        assert!(store.remove(temp.path(), r"\.lock$").unwrap());
        assert!(!store.remove(temp.path(), "never-added").unwrap());
        let on_disk = std::fs::read_to_string(temp.path().join(IGNORE_FILE)).unwrap();
        assert_eq!(on_disk, "^dist/\n");
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        assert_eq!(
            parse_patterns("# generated\n\n^target/\r\n  \n\\.min\\.js$\n"),
            vec!["^target/".to_string(), "\\.min\\.js$".to_string()]
        );
    }
}
