// ABOUTME: Error types for the outbound command channel
// Transport failures are absorbed by the channel; launch failures reach the session layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Transport closed")]
    Closed,

    #[error("Write to transport failed: {0}")]
    WriteFailed(String),

    #[error("Failed to launch assistant: {0}")]
    LaunchFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
