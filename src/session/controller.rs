// ABOUTME: SessionController owns the lifecycle of the single assistant session
// Starting tears down any previous session; stopping is idempotent

use crate::channel::{ChannelError, CommandChannel, Launcher};
use crate::config::{AppConfig, ConfigError};
use crate::session::model::{Session, SessionState};
use crate::session::startup::build_launch_spec;
use crate::workspace::{PathResolver, WorkspaceRoot};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start assistant: {0}")]
    Launch(#[from] ChannelError),
}

pub struct SessionController {
    launcher: Box<dyn Launcher>,
    resolver: PathResolver,
    session: Option<Session>,
    channel: Option<CommandChannel>,
}

impl SessionController {
    pub fn new(launcher: Box<dyn Launcher>, resolver: PathResolver) -> Self {
        Self {
            launcher,
            resolver,
            session: None,
            channel: None,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Start a new session, stopping the current one first.
    ///
    /// Nothing is launched unless the configuration validates; on failure no
    /// session is retained.
    pub fn start(&mut self, config: &AppConfig) -> Result<&Session, SessionError> {
        self.stop();
        self.session = None;

        let start_dir = config.start_directory()?;
        let root = self.resolver.resolve_root(start_dir);
        let working_directory = self.resolver.resolve_project_dir(start_dir);

        let name = working_directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "workspace".to_string());
        let spec = build_launch_spec(config, &name, &working_directory)?;

        let transport = self.launcher.launch(&spec)?;
        let mut session = Session::new(working_directory, root.clone(), spec.command_line.clone(), &spec.env);
        session.state = SessionState::Active;

        info!(
            "Session {} started in {} (root {})",
            session.id,
            session.working_directory.display(),
            root.path().display()
        );

        self.channel = Some(CommandChannel::new(transport, root.path()));
        Ok(self.session.insert(session))
    }

    /// Send `/exit`, dispose the transport and mark the session closed.
    /// Returns false when there was no active session.
    pub fn stop(&mut self) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            return false;
        };

        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        session.mark_closed();
        info!("Session {} stopped", session.id);
        true
    }

    /// Cleanup after the process ended on its own. Nothing is sent.
    pub fn handle_exit(&mut self) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            return false;
        };

        if let Some(mut channel) = self.channel.take() {
            channel.detach();
        }
        session.mark_closed();
        warn!("Assistant process for session {} exited", session.id);
        true
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active)
    }

    /// Whether the live transport reports its process still running.
    pub fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(CommandChannel::is_alive)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::NotStarted, |s| s.state)
    }

    /// Root of the active session.
    pub fn root(&self) -> Option<&WorkspaceRoot> {
        self.session.as_ref().filter(|s| s.is_active()).map(|s| &s.root)
    }

    /// Channel of the active session, if any.
    pub fn channel_mut(&mut self) -> Option<&mut CommandChannel> {
        if self.is_active() {
            self.channel.as_mut()
        } else {
            None
        }
    }

    pub fn recent_output(&self) -> Option<String> {
        self.channel.as_ref().and_then(CommandChannel::recent_output)
    }
}
