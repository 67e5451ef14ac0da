// ABOUTME: Transport and Launcher traits that sit between the channel and a live process
// A launcher starts the assistant; the transport it returns accepts raw text writes

use crate::channel::ChannelError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything needed to start one assistant process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub name: String,
    pub working_directory: PathBuf,
    pub command_line: String,
    pub env: BTreeMap<String, String>,
}

/// A line sink into a running assistant. No reply channel exists.
pub trait Transport: Send {
    /// Write `text`, followed by a line terminator when `add_newline` is set.
    fn send_text(&mut self, text: &str, add_newline: bool) -> Result<(), ChannelError>;

    /// Whether the underlying process is still running.
    fn is_alive(&self) -> bool {
        true
    }

    /// Best-effort snapshot of recent process output, for diagnostics only.
    fn recent_output(&self) -> Option<String> {
        None
    }

    fn dispose(&mut self);
}

pub trait Launcher: Send {
    fn launch(&mut self, spec: &LaunchSpec) -> Result<Box<dyn Transport>, ChannelError>;
}
