// ABOUTME: In-memory launcher and transport that record every frame written
// Used by tests in place of a tmux-backed assistant

use crate::channel::{ChannelError, LaunchSpec, Launcher, Transport};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One write to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub session: String,
    pub text: String,
    pub newline: bool,
}

#[derive(Debug, Default)]
struct MemoryLog {
    frames: Vec<SentFrame>,
    launches: Vec<LaunchSpec>,
    alive: bool,
    disposed: bool,
    refuse_launch: Option<String>,
}

/// Shared view onto everything a [`MemoryLauncher`] and its transports saw.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    log: Arc<Mutex<MemoryLog>>,
}

impl MemoryHandle {
    fn lock(&self) -> MutexGuard<'_, MemoryLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn frames(&self) -> Vec<SentFrame> {
        self.lock().frames.clone()
    }

    /// Text of every frame, in write order.
    pub fn lines(&self) -> Vec<String> {
        self.lock().frames.iter().map(|f| f.text.clone()).collect()
    }

    /// Lines starting with `prefix`.
    pub fn lines_starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines().into_iter().filter(|l| l.starts_with(prefix)).collect()
    }

    pub fn launches(&self) -> Vec<LaunchSpec> {
        self.lock().launches.clone()
    }

    pub fn clear(&self) {
        self.lock().frames.clear();
    }

    /// Simulate the assistant exiting on its own.
    pub fn terminate(&self) {
        self.lock().alive = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Make the next launches fail with `reason`.
    pub fn refuse_launch(&self, reason: &str) {
        self.lock().refuse_launch = Some(reason.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryLauncher {
    handle: MemoryHandle,
}

impl MemoryLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemoryHandle {
        self.handle.clone()
    }
}

impl Launcher for MemoryLauncher {
    fn launch(&mut self, spec: &LaunchSpec) -> Result<Box<dyn Transport>, ChannelError> {
        let mut log = self.handle.lock();
        if let Some(reason) = &log.refuse_launch {
            return Err(ChannelError::LaunchFailed(reason.clone()));
        }
        log.launches.push(spec.clone());
        log.alive = true;
        log.disposed = false;
        drop(log);

        Ok(Box::new(MemoryTransport {
            session: spec.name.clone(),
            handle: self.handle.clone(),
            disposed: false,
        }))
    }
}

struct MemoryTransport {
    session: String,
    handle: MemoryHandle,
    disposed: bool,
}

impl Transport for MemoryTransport {
    fn send_text(&mut self, text: &str, add_newline: bool) -> Result<(), ChannelError> {
        let mut log = self.handle.lock();
        if self.disposed || !log.alive {
            return Err(ChannelError::Closed);
        }
        log.frames.push(SentFrame {
            session: self.session.clone(),
            text: text.to_string(),
            newline: add_newline,
        });
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.disposed && self.handle.lock().alive
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            let mut log = self.handle.lock();
            log.disposed = true;
            log.alive = false;
        }
    }
}
