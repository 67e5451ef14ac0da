// ABOUTME: Tmux-backed transport for the assistant process
// Starts aider in a detached tmux session and types commands into its pane

pub mod capture;
pub mod error;
pub mod session;

pub use capture::CaptureOptions;
pub use error::TmuxError;
pub use session::{TmuxLauncher, TmuxSession};
