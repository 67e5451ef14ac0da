// ABOUTME: ReconciliationEngine, the collaborator-facing API of the bridge
// Coordinates session lifecycle, debounced sync passes, dictation and ad hoc prompts

use crate::channel::Launcher;
use crate::config::AppConfig;
use crate::dictation::{DictationState, DictationToggle};
use crate::engine::events::BridgeEvent;
use crate::filter::{FilterError, IgnoreFile, IgnoreMatcher, IgnoreSource};
use crate::prompts::{snippet_prompt, Snippet, README_PROMPT, REFACTOR_TASK};
use crate::session::{Session, SessionController, SessionError, SessionState};
use crate::sync::reconciler::{ADD_COMMAND, DROP_COMMAND};
use crate::sync::{EditorDocument, FileSetReconciler, OpenDocuments, ReconcileOutcome};
use crate::timer::{earliest, Deadline};
use crate::workspace::{normalize_path, PathResolver};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const READ_ONLY_COMMAND: &str = "/read-only";

/// Why a session ended, passed to close listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloseReason {
    Requested,
    ProcessExited,
    Restarted,
}

type CloseListener = Box<dyn FnMut(&Session, CloseReason) + Send>;

/// Snapshot of engine state for troubleshooting.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub state: SessionState,
    pub session: Option<Session>,
    pub configured_working_directory: Option<PathBuf>,
    pub provider: Option<&'static str>,
    pub known_files: Vec<PathBuf>,
    pub editor_files: Vec<PathBuf>,
    pub ignore_patterns: Vec<String>,
    pub dictation: DictationState,
    pub sync_pending: bool,
    pub recent_output: Option<String>,
}

pub struct ReconciliationEngine {
    config: Option<AppConfig>,
    controller: SessionController,
    ignore_source: Box<dyn IgnoreSource>,
    reconciler: FileSetReconciler,
    documents: OpenDocuments,
    dictation: DictationToggle,
    sync_deadline: Deadline,
    debounce: Duration,
    close_listeners: Vec<CloseListener>,
}

impl ReconciliationEngine {
    /// Engine with the default root markers and the on-disk ignore list.
    pub fn new(launcher: impl Launcher + 'static) -> Self {
        Self::with_parts(
            Box::new(launcher),
            PathResolver::new(),
            Box::new(IgnoreFile::default()),
        )
    }

    pub fn with_parts(
        launcher: Box<dyn Launcher>,
        resolver: PathResolver,
        ignore_source: Box<dyn IgnoreSource>,
    ) -> Self {
        let defaults = AppConfig::default();
        Self {
            config: None,
            controller: SessionController::new(launcher, resolver),
            ignore_source,
            reconciler: FileSetReconciler::new(),
            documents: OpenDocuments::new(),
            dictation: DictationToggle::new(defaults.dictation_delay()),
            sync_deadline: Deadline::new(),
            debounce: defaults.sync_debounce(),
            close_listeners: Vec::new(),
        }
    }

    pub fn with_ignore_source(mut self, source: impl IgnoreSource + 'static) -> Self {
        self.ignore_source = Box::new(source);
        self
    }

    /// Remember `config` for later implicit starts without opening a session.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.adopt_timing(&config);
        self.config = Some(config);
        self
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.as_ref()
    }

    // Session lifecycle

    /// Start a session for `config`, tearing down any active one first,
    /// then add every open workspace document.
    pub fn open(&mut self, config: AppConfig) -> Result<Session, SessionError> {
        self.end_session(CloseReason::Restarted);
        self.adopt_timing(&config);
        let config = self.config.insert(config);

        let session = self.controller.start(config)?.clone();
        self.sync_now();
        Ok(session)
    }

    /// Stop the active session. Idempotent; returns false if none was active.
    pub fn close(&mut self) -> bool {
        self.end_session(CloseReason::Requested)
    }

    /// The assistant ended on its own: same cleanup as `close`, minus `/exit`.
    pub fn handle_process_exit(&mut self) -> bool {
        self.end_session(CloseReason::ProcessExited)
    }

    /// Check the transport and run exit cleanup if the process is gone.
    pub fn poll_process(&mut self) -> bool {
        if self.controller.is_active() && !self.controller.is_alive() {
            return self.handle_process_exit();
        }
        false
    }

    /// Switch configuration; restarts an active session when the provider changed.
    pub fn apply_config(&mut self, config: AppConfig) -> Result<(), SessionError> {
        let restart = self.is_active()
            && self
                .config
                .as_ref()
                .map_or(true, |current| current.requires_restart(&config));

        if restart {
            info!("Provider configuration changed, restarting session");
            self.open(config)?;
        } else {
            self.adopt_timing(&config);
            self.config = Some(config);
        }
        Ok(())
    }

    pub fn on_close(&mut self, listener: impl FnMut(&Session, CloseReason) + Send + 'static) {
        self.close_listeners.push(Box::new(listener));
    }

    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }

    pub fn session(&self) -> Option<&Session> {
        self.controller.session()
    }

    fn adopt_timing(&mut self, config: &AppConfig) {
        self.debounce = config.sync_debounce();
        self.dictation.set_delay(config.dictation_delay());
    }

    fn end_session(&mut self, reason: CloseReason) -> bool {
        let ended = match reason {
            CloseReason::ProcessExited => self.controller.handle_exit(),
            CloseReason::Requested | CloseReason::Restarted => self.controller.stop(),
        };

        // Pending timers and the known set never outlive their session
        self.sync_deadline.cancel();
        self.dictation.reset();
        self.reconciler.clear();

        if ended {
            if let Some(session) = self.controller.session() {
                for listener in &mut self.close_listeners {
                    listener(session, reason);
                }
            }
        }
        ended
    }

    /// Start a session from the remembered configuration if none is active.
    fn ensure_session(&mut self) -> bool {
        if self.is_active() {
            return true;
        }
        let Some(config) = self.config.clone() else {
            warn!("No active session and no configuration to start one");
            return false;
        };
        match self.open(config) {
            Ok(session) => {
                info!("Started session {} on demand", session.id);
                true
            }
            Err(e) => {
                error!("Could not start session on demand: {}", e);
                false
            }
        }
    }

    // Workspace membership

    pub fn is_workspace_file(&self, path: &Path) -> bool {
        self.controller
            .root()
            .is_some_and(|root| root.contains(path))
    }

    pub fn known_files(&self) -> Vec<PathBuf> {
        self.reconciler.known().iter().cloned().collect()
    }

    pub fn editor_files(&self) -> Vec<PathBuf> {
        self.documents.iter().cloned().collect()
    }

    fn workspace_members(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths
            .iter()
            .map(|p| normalize_path(p))
            .filter(|p| {
                let member = self.is_workspace_file(p);
                if !member {
                    warn!("Skipping {} outside the workspace root", p.display());
                }
                member
            })
            .collect()
    }

    // Explicit file operations

    pub fn add_file(&mut self, path: &Path) {
        self.add_files(&[path.to_path_buf()]);
    }

    /// Send `/add` immediately and mark the files known.
    pub fn add_files(&mut self, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        let was_active = self.is_active();
        if !self.ensure_session() {
            return;
        }

        // Files the on-demand start already synced are not sent twice
        let paths: Vec<PathBuf> = self
            .workspace_members(paths)
            .into_iter()
            .filter(|p| was_active || !self.reconciler.is_known(p))
            .collect();
        if paths.is_empty() {
            return;
        }

        if let Some(channel) = self.controller.channel_mut() {
            channel.send_with_paths(ADD_COMMAND, &paths);
            self.reconciler.track(&paths);
        }
    }

    pub fn drop_file(&mut self, path: &Path) {
        self.drop_files(&[path.to_path_buf()]);
    }

    /// Send `/drop` immediately and forget the files.
    pub fn drop_files(&mut self, paths: &[PathBuf]) {
        if paths.is_empty() || !self.is_active() {
            return;
        }
        let paths = self.workspace_members(paths);
        if paths.is_empty() {
            return;
        }

        if let Some(channel) = self.controller.channel_mut() {
            channel.send_with_paths(DROP_COMMAND, &paths);
            self.reconciler.untrack(&paths);
        }
    }

    pub fn add_read_only_file(&mut self, path: &Path) {
        self.add_read_only_files(&[path.to_path_buf()]);
    }

    /// Send `/read-only`. Read-only files are not part of the known set.
    pub fn add_read_only_files(&mut self, paths: &[PathBuf]) {
        if paths.is_empty() || !self.ensure_session() {
            return;
        }
        let paths = self.workspace_members(paths);
        if paths.is_empty() {
            return;
        }
        if let Some(channel) = self.controller.channel_mut() {
            channel.send_with_paths(READ_ONLY_COMMAND, &paths);
        }
    }

    // Prompts

    /// Free-text command, collapsed to one line. Dropped when no session is active.
    pub fn send_command(&mut self, text: &str) {
        match self.controller.channel_mut() {
            Some(channel) => channel.send(text),
            None => debug!("No active session, command dropped"),
        }
    }

    pub fn refactor_snippet(&mut self, snippet: &Snippet) {
        self.snippet_request(REFACTOR_TASK, snippet);
    }

    /// Ask for `instruction` applied to `snippet`. An empty instruction is a cancel.
    pub fn modify_snippet(&mut self, snippet: &Snippet, instruction: &str) {
        if instruction.trim().is_empty() {
            debug!("Empty modification instruction, nothing sent");
            return;
        }
        self.snippet_request(instruction, snippet);
    }

    pub fn generate_readme(&mut self) {
        self.send_command(README_PROMPT);
    }

    fn snippet_request(&mut self, task: &str, snippet: &Snippet) {
        if snippet.text.trim().is_empty() {
            warn!("No text selected, snippet request skipped");
            return;
        }
        let Some(root) = self.controller.root().map(|r| r.path().to_path_buf()) else {
            debug!("No active session, snippet request dropped");
            return;
        };
        let prompt = snippet_prompt(task, snippet, &root);
        self.send_command(&prompt);
    }

    // Dictation

    /// Push-to-talk: `true` on key down, `false` on key up.
    pub fn toggle_dictation(&mut self, pressed: bool, now: Instant) {
        let Some(channel) = self.controller.channel_mut() else {
            return;
        };
        if pressed {
            self.dictation.press(channel);
        } else {
            self.dictation.release(now);
        }
    }

    pub fn dictation_state(&self) -> DictationState {
        self.dictation.state()
    }

    // Editor events and reconciliation

    pub fn document_opened(&mut self, document: &EditorDocument, now: Instant) {
        if self.documents.open(document) {
            self.schedule_sync(now);
        }
    }

    pub fn document_closed(&mut self, document: &EditorDocument, now: Instant) {
        if self.documents.close(document) {
            self.schedule_sync(now);
        }
    }

    pub fn replace_documents(&mut self, documents: &[EditorDocument], now: Instant) {
        self.documents.replace(documents);
        self.schedule_sync(now);
    }

    /// Cancel-and-replace the debounce deadline.
    fn schedule_sync(&mut self, now: Instant) {
        if self.is_active() {
            self.sync_deadline.arm(now, self.debounce);
        }
    }

    pub fn sync_pending(&self) -> bool {
        self.sync_deadline.is_pending()
    }

    /// Run a reconciliation pass now, dropping any pending debounced one.
    pub fn sync_now(&mut self) -> Option<ReconcileOutcome> {
        self.sync_deadline.cancel();
        self.run_sync_pass()
    }

    fn run_sync_pass(&mut self) -> Option<ReconcileOutcome> {
        let root = self.controller.root()?.path().to_path_buf();
        let matcher = self.ignore_matcher_for(&root);
        let current: BTreeSet<PathBuf> = self
            .documents
            .iter()
            .filter(|p| p.starts_with(&root))
            .cloned()
            .collect();

        let channel = self.controller.channel_mut()?;
        Some(self.reconciler.reconcile(&current, &root, &matcher, channel))
    }

    // Ignore list

    /// Configured patterns followed by the persisted list for `root`.
    pub fn ignore_patterns_for(&self, root: &Path) -> Vec<String> {
        let mut patterns = self
            .config
            .as_ref()
            .map(|c| c.ignore_patterns.clone())
            .unwrap_or_default();

        match self.ignore_source.load(root) {
            Ok(stored) => patterns.extend(stored),
            Err(e) => warn!("Ignore list unavailable, using configured patterns only: {}", e),
        }
        patterns
    }

    fn ignore_matcher_for(&self, root: &Path) -> IgnoreMatcher {
        IgnoreMatcher::compile(self.ignore_patterns_for(root))
    }

    /// Root the ignore list is stored under: the session's, else the
    /// configured start directory's.
    fn ignore_root(&self) -> Option<PathBuf> {
        if let Some(root) = self.controller.root() {
            return Some(root.path().to_path_buf());
        }
        let start = self.config.as_ref()?.start_directory().ok()?;
        Some(self.controller.resolver().resolve_root(start).path().to_path_buf())
    }

    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<(), FilterError> {
        let root = self.ignore_root().ok_or(FilterError::NoRoot)?;
        self.ignore_source.append(&root, pattern)
    }

    pub fn remove_ignore_pattern(&mut self, pattern: &str) -> Result<bool, FilterError> {
        let root = self.ignore_root().ok_or(FilterError::NoRoot)?;
        self.ignore_source.remove(&root, pattern)
    }

    // Scheduling

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(&[self.sync_deadline.at(), self.dictation.deadline()])
    }

    /// Fire every deadline that has passed by `now`.
    pub fn fire_due(&mut self, now: Instant) {
        if self.sync_deadline.take_if_due(now) {
            self.run_sync_pass();
        }
        if let Some(channel) = self.controller.channel_mut() {
            self.dictation.fire_due(now, channel);
        }
    }

    /// Dispatch one inbound event.
    pub fn handle(&mut self, event: BridgeEvent, now: Instant) {
        match event {
            BridgeEvent::Opened { path, scheme } => {
                self.document_opened(&EditorDocument::new(path, scheme), now);
            }
            BridgeEvent::Closed { path, scheme } => {
                self.document_closed(&EditorDocument::new(path, scheme), now);
            }
            BridgeEvent::Snapshot { documents } => self.replace_documents(&documents, now),
            BridgeEvent::Sync => {
                if self.sync_now().is_none() {
                    warn!("Sync requested but no session is active");
                }
            }
            BridgeEvent::Add { paths } => self.add_files(&paths),
            BridgeEvent::Drop { paths } => self.drop_files(&paths),
            BridgeEvent::ReadOnly { paths } => self.add_read_only_files(&paths),
            BridgeEvent::Prompt { text } => self.send_command(&text),
            BridgeEvent::Dictation { pressed } => self.toggle_dictation(pressed, now),
            BridgeEvent::Refactor { path, line, text } => {
                self.refactor_snippet(&Snippet { path, line, text });
            }
            BridgeEvent::Modify { path, line, text, instruction } => {
                self.modify_snippet(&Snippet { path, line, text }, &instruction);
            }
            BridgeEvent::Readme => self.generate_readme(),
            BridgeEvent::Open => {
                if self.is_active() {
                    debug!("Session already active");
                } else if let Some(config) = self.config.clone() {
                    if let Err(e) = self.open(config) {
                        error!("Failed to open session: {}", e);
                    }
                } else {
                    warn!("Open requested without a configuration");
                }
            }
            BridgeEvent::Close => {
                if !self.close() {
                    debug!("Close requested but no session is active");
                }
            }
            BridgeEvent::IgnoreAdd { pattern } => {
                if let Err(e) = self.add_ignore_pattern(&pattern) {
                    error!("Failed to add ignore pattern: {}", e);
                }
            }
            BridgeEvent::IgnoreRemove { pattern } => {
                if let Err(e) = self.remove_ignore_pattern(&pattern) {
                    error!("Failed to remove ignore pattern: {}", e);
                }
            }
            BridgeEvent::Debug => match serde_json::to_string_pretty(&self.debug_report()) {
                Ok(report) => info!("Debug report:\n{}", report),
                Err(e) => warn!("Failed to serialize debug report: {}", e),
            },
            BridgeEvent::ProcessExited => {
                self.handle_process_exit();
            }
        }
    }

    pub fn debug_report(&self) -> DebugReport {
        let ignore_patterns = self
            .ignore_root()
            .map(|root| self.ignore_patterns_for(&root))
            .unwrap_or_default();

        DebugReport {
            state: self.controller.state(),
            session: self.controller.session().cloned(),
            configured_working_directory: self
                .config
                .as_ref()
                .and_then(|c| c.working_directory.clone()),
            provider: self.config.as_ref().map(|c| c.provider.display_name()),
            known_files: self.known_files(),
            editor_files: self.editor_files(),
            ignore_patterns,
            dictation: self.dictation.state(),
            sync_pending: self.sync_pending(),
            recent_output: self.controller.recent_output(),
        }
    }
}
