// ABOUTME: Inbound events from the editor integration layer
// Serialized as one JSON object per line, tagged by "event"

use crate::sync::EditorDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_scheme() -> String {
    crate::sync::FILE_SCHEME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A document was opened in the editor
    Opened {
        path: PathBuf,
        #[serde(default = "default_scheme")]
        scheme: String,
    },
    /// A document was closed in the editor
    Closed {
        path: PathBuf,
        #[serde(default = "default_scheme")]
        scheme: String,
    },
    /// Full list of open documents, replacing the previous view
    Snapshot { documents: Vec<EditorDocument> },
    /// Reconcile immediately
    Sync,
    Add { paths: Vec<PathBuf> },
    Drop { paths: Vec<PathBuf> },
    ReadOnly { paths: Vec<PathBuf> },
    Prompt { text: String },
    Dictation { pressed: bool },
    Refactor { path: PathBuf, line: u32, text: String },
    Modify { path: PathBuf, line: u32, text: String, instruction: String },
    Readme,
    Open,
    Close,
    IgnoreAdd { pattern: String },
    IgnoreRemove { pattern: String },
    Debug,
    /// The assistant process ended without being asked to
    ProcessExited,
}

impl BridgeEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
