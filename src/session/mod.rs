// ABOUTME: Session management for the assistant process
// Provides startup command assembly, lifecycle control and teardown

pub mod controller;
pub mod model;
pub mod startup;

pub use controller::{SessionController, SessionError};
pub use model::{Session, SessionState};
pub use startup::{build_command_line, build_launch_spec};
