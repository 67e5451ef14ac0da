// ABOUTME: TmuxSession runs the assistant in a detached tmux session on the host
// Implements the channel Transport by typing literal text into the pane with send-keys

use crate::channel::{ChannelError, LaunchSpec, Launcher, Transport};
use crate::tmux::capture::{capture_pane, CaptureOptions};
use crate::tmux::error::TmuxError;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Prefix on every session this crate creates.
pub const SESSION_PREFIX: &str = "aider_bridge";

pub struct TmuxSession {
    pub name: String,
    pub working_directory: PathBuf,
    pub command_line: String,
    killed: bool,
}

impl TmuxSession {
    /// Check if tmux is installed on the host
    pub fn check_tmux_installed() -> Result<(), TmuxError> {
        let output = Command::new("which")
            .arg("tmux")
            .output()
            .map_err(|_| TmuxError::TmuxNotInstalled)?;

        if !output.status.success() {
            return Err(TmuxError::TmuxNotInstalled);
        }
        Ok(())
    }

    /// Tmux-safe session name for `name`, scoped to this bridge process
    /// so bridges on same-named projects never share a session.
    pub fn session_name(name: &str) -> String {
        let sanitized: String = name
            .chars()
            .map(|c| if c.is_whitespace() || c == '.' || c == ':' { '_' } else { c })
            .collect();
        format!("{SESSION_PREFIX}_{sanitized}_{}", std::process::id())
    }

    /// Create a detached tmux session running `command_line` in `working_directory`
    pub fn create(
        name: &str,
        working_directory: &Path,
        command_line: &str,
        env_vars: &BTreeMap<String, String>,
    ) -> Result<Self, TmuxError> {
        Self::check_tmux_installed()?;

        let session_name = Self::session_name(name);

        // Only an earlier session of this same process can hold the name
        if Self::has_session(&session_name) {
            warn!("Replacing stale tmux session {}", session_name);
            Command::new("tmux")
                .args(["kill-session", "-t", &session_name])
                .output()?;
        }

        let mut cmd = Command::new("tmux");
        cmd.arg("new-session")
            .arg("-d") // Detached
            .arg("-s")
            .arg(&session_name)
            .arg("-c")
            .arg(working_directory);

        // Credentials go to the session environment, not the tmux server's
        for (key, value) in env_vars {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }

        cmd.arg(command_line);

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(format!(
                "Failed to create tmux session: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Command::new("tmux")
            .args(["set-option", "-t", &session_name, "history-limit", "10000"])
            .output()?;

        info!("Started assistant in tmux session {}", session_name);

        Ok(Self {
            name: session_name,
            working_directory: working_directory.to_path_buf(),
            command_line: command_line.to_string(),
            killed: false,
        })
    }

    pub fn has_session(session_name: &str) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", session_name])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Type `text` literally into the pane, then press Enter if asked
    pub fn send_keys(&self, text: &str, enter: bool) -> Result<(), TmuxError> {
        if !text.is_empty() {
            let literal = escape_literal(text);
            let output = Command::new("tmux")
                .args(["send-keys", "-t", &self.name, "-l", "--", literal.as_ref()])
                .output()?;
            self.check_send(&output)?;
        }

        if enter {
            let output = Command::new("tmux")
                .args(["send-keys", "-t", &self.name, "Enter"])
                .output()?;
            self.check_send(&output)?;
        }

        Ok(())
    }

    fn check_send(&self, output: &std::process::Output) -> Result<(), TmuxError> {
        if output.status.success() {
            return Ok(());
        }
        if Self::has_session(&self.name) {
            Err(TmuxError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        } else {
            Err(TmuxError::SessionNotFound(self.name.clone()))
        }
    }

    /// Kill the tmux session
    pub fn kill(&mut self) -> Result<(), TmuxError> {
        if self.killed {
            return Ok(());
        }
        self.killed = true;

        Command::new("tmux")
            .args(["kill-session", "-t", &self.name])
            .output()?;

        Ok(())
    }
}

/// tmux treats a trailing `;` on any argument as a command separator.
fn escape_literal(text: &str) -> Cow<'_, str> {
    match text.strip_suffix(';') {
        Some(head) => Cow::Owned(format!("{head}\\;")),
        None => Cow::Borrowed(text),
    }
}

impl Transport for TmuxSession {
    fn send_text(&mut self, text: &str, add_newline: bool) -> Result<(), ChannelError> {
        if self.killed {
            return Err(ChannelError::Closed);
        }
        self.send_keys(text, add_newline).map_err(ChannelError::from)
    }

    fn is_alive(&self) -> bool {
        !self.killed && Self::has_session(&self.name)
    }

    fn recent_output(&self) -> Option<String> {
        capture_pane(&self.name, &CaptureOptions::tail(200))
            .map_err(|e| debug!("Pane capture failed: {}", e))
            .ok()
    }

    fn dispose(&mut self) {
        if let Err(e) = self.kill() {
            warn!("Failed to kill tmux session {}: {}", self.name, e);
        }
    }
}

/// Launches each assistant session in tmux.
#[derive(Debug, Default)]
pub struct TmuxLauncher;

impl Launcher for TmuxLauncher {
    fn launch(&mut self, spec: &LaunchSpec) -> Result<Box<dyn Transport>, ChannelError> {
        let session = TmuxSession::create(
            &spec.name,
            &spec.working_directory,
            &spec.command_line,
            &spec.env,
        )?;
        Ok(Box::new(session))
    }
}
