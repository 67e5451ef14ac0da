// ABOUTME: Outbound command channel to the assistant process
// Formats single-line commands and writes them to whatever transport the session owns

pub mod command;
pub mod error;
pub mod memory;
pub mod transport;

pub use command::{collapse_whitespace, format_command, format_path, CommandChannel, LineDiscipline};
pub use error::ChannelError;
pub use memory::{MemoryHandle, MemoryLauncher, SentFrame};
pub use transport::{LaunchSpec, Launcher, Transport};
