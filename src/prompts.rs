// ABOUTME: Prompt builders for ad hoc requests relayed to the assistant
// Snippet text is flattened so each request travels as a single command line

use crate::workspace::resolver::to_display_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const REFACTOR_TASK: &str = "Refactor the following code to improve its structure, performance and readability without changing its functionality:";

pub const README_PROMPT: &str = "Generate a comprehensive README.md file for the project in the current workspace. Include sections for introduction, features, installation, usage, configuration, and any other relevant information based on the project files and structure.";

/// A selection in an editor document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub path: PathBuf,
    /// 1-based line of the selection start
    pub line: u32,
    pub text: String,
}

/// Build a snippet request. Source newlines are escaped as a literal `\n`
/// so the code's line structure survives the single-line command.
pub fn snippet_prompt(task: &str, snippet: &Snippet, root: &Path) -> String {
    let code = snippet.text.replace("\r\n", "\\n").replace('\n', "\\n");
    format!(
        "{}\n\nFile: {}\nLine: {}\n\n{}",
        task.trim(),
        to_display_path(&snippet.path, root),
        snippet.line,
        code
    )
}
