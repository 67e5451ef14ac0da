// ABOUTME: Session data model for one assistant process bound to a workspace root

use crate::workspace::WorkspaceRoot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NotStarted,
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub working_directory: PathBuf,
    pub root: WorkspaceRoot,
    pub startup_command_line: String,
    /// Names only; values are credentials
    pub environment_vars: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        working_directory: PathBuf,
        root: WorkspaceRoot,
        startup_command_line: String,
        env: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::NotStarted,
            working_directory,
            root,
            startup_command_line,
            environment_vars: env.keys().cloned().collect(),
            started_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
        self.closed_at = Some(Utc::now());
    }
}
