// ABOUTME: CommandChannel formats commands and writes them to the session transport
// Every command becomes exactly one line; writes on a closed channel are dropped

use crate::channel::{ChannelError, Transport};
use crate::workspace::resolver::to_display_path;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

lazy_static! {
    static ref LINE_BREAKERS: Regex =
        Regex::new(r"[\s\p{Cc}]+").expect("line breaker pattern is valid");
}

/// Control sequence used to confirm a dictation or an empty prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDiscipline {
    /// Empty line followed by the terminator.
    Unix,
    /// Bare carriage return, no terminator.
    Windows,
}

impl LineDiscipline {
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

/// Collapse every run of whitespace or control characters to one space and
/// trim the ends.
pub fn collapse_whitespace(line: &str) -> String {
    LINE_BREAKERS.replace_all(line, " ").trim().to_string()
}

/// Root-relative form of `path`, double-quoted when it contains whitespace.
pub fn format_path(path: &Path, root: &Path) -> String {
    let display = to_display_path(path, root);
    if display.chars().any(char::is_whitespace) {
        format!("\"{display}\"")
    } else {
        display
    }
}

/// Build the line for `command` followed by `paths`.
pub fn format_command(command: &str, paths: &[PathBuf], root: &Path) -> String {
    let mut line = command.to_string();
    for path in paths {
        line.push(' ');
        line.push_str(&format_path(path, root));
    }
    collapse_whitespace(&line)
}

pub struct CommandChannel {
    transport: Option<Box<dyn Transport>>,
    root: PathBuf,
    discipline: LineDiscipline,
}

impl CommandChannel {
    pub fn new(transport: Box<dyn Transport>, root: impl Into<PathBuf>) -> Self {
        Self {
            transport: Some(transport),
            root: root.into(),
            discipline: LineDiscipline::current(),
        }
    }

    /// A channel with no transport; every send is a no-op.
    pub fn detached(root: impl Into<PathBuf>) -> Self {
        Self {
            transport: None,
            root: root.into(),
            discipline: LineDiscipline::current(),
        }
    }

    pub fn with_discipline(mut self, discipline: LineDiscipline) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_alive())
    }

    pub fn recent_output(&self) -> Option<String> {
        self.transport.as_ref().and_then(|t| t.recent_output())
    }

    /// Send a single-line command.
    pub fn send(&mut self, command: &str) {
        let line = collapse_whitespace(command);
        self.write(&line, true);
    }

    /// Send `command` followed by the batched, formatted `paths`.
    pub fn send_with_paths(&mut self, command: &str, paths: &[PathBuf]) {
        let line = format_command(command, paths, &self.root);
        self.write(&line, true);
    }

    /// Write `line` verbatim plus a terminator, bypassing whitespace collapsing.
    pub fn send_raw(&mut self, line: &str) {
        self.write(line, true);
    }

    pub fn send_confirm(&mut self) {
        match self.discipline {
            LineDiscipline::Unix => self.write("", true),
            LineDiscipline::Windows => self.write("\r", false),
        }
    }

    /// Ask the assistant to exit, then release the transport.
    pub fn close(&mut self) {
        if self.transport.is_some() {
            self.send_raw("/exit");
        }
        self.detach();
    }

    /// Release the transport without sending anything.
    pub fn detach(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.dispose();
        }
    }

    fn write(&mut self, text: &str, add_newline: bool) {
        let Some(transport) = self.transport.as_mut() else {
            debug!("Dropping command on closed channel: {}", text);
            return;
        };

        debug!("Sending to assistant: {}", text);
        match transport.send_text(text, add_newline) {
            Ok(()) => {}
            Err(ChannelError::Closed) => {
                debug!("Transport already closed, command dropped");
            }
            Err(e) => {
                warn!("Failed to send command to assistant: {}", e);
            }
        }
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.detach();
    }
}
