// ABOUTME: Error types for tmux session management
// Defines error conditions that can occur when driving the assistant through tmux

use crate::channel::ChannelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("Tmux not installed on host")]
    TmuxNotInstalled,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Tmux command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<TmuxError> for ChannelError {
    fn from(err: TmuxError) -> Self {
        match err {
            TmuxError::SessionNotFound(_) => Self::Closed,
            TmuxError::IoError(e) => Self::IoError(e),
            other => Self::LaunchFailed(other.to_string()),
        }
    }
}
