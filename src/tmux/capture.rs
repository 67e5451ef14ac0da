// ABOUTME: Tmux pane content capture utilities
//
// Captures the assistant's pane for diagnostics. Output is never parsed;
// it only feeds the debug report.

use crate::tmux::TmuxError;
use std::process::Command;

/// Options for capturing tmux pane content
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Start line for capture ("-" for start of history, negative for scrollback, None for visible area)
    pub start_line: Option<String>,
    /// Whether to include ANSI escape sequences in the output
    pub include_escape_sequences: bool,
    /// Whether to join wrapped lines
    pub join_wrapped_lines: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            start_line: None,
            include_escape_sequences: false,
            join_wrapped_lines: true,
        }
    }
}

impl CaptureOptions {
    /// The last `lines` lines of scrollback plus the visible area
    pub fn tail(lines: u32) -> Self {
        Self {
            start_line: Some(format!("-{lines}")),
            ..Self::default()
        }
    }

    fn args(&self, session_name: &str) -> Vec<String> {
        let mut args = vec![
            "capture-pane".to_string(),
            "-p".to_string(),
            "-t".to_string(),
            session_name.to_string(),
        ];
        if self.include_escape_sequences {
            args.push("-e".to_string());
        }
        if self.join_wrapped_lines {
            args.push("-J".to_string());
        }
        if let Some(start) = &self.start_line {
            args.push(format!("-S{start}"));
        }
        args
    }
}

/// Capture content from a tmux pane
pub fn capture_pane(session_name: &str, options: &CaptureOptions) -> Result<String, TmuxError> {
    let output = Command::new("tmux").args(options.args(session_name)).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TmuxError::CommandFailed(format!(
            "Failed to capture pane content: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
