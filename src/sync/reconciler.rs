// ABOUTME: FileSetReconciler diffs the editor's file set against the known set
// One pass emits at most one batched /add and one batched /drop

use crate::channel::CommandChannel;
use crate::filter::IgnoreMatcher;
use crate::workspace::normalize_path;
use crate::workspace::resolver::to_display_path;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ADD_COMMAND: &str = "/add";
pub const DROP_COMMAND: &str = "/drop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcilerState {
    Idle,
    Reconciling,
}

/// Result of one reconciliation pass. Lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Changed paths withheld by the ignore filter
    pub ignored: Vec<PathBuf>,
}

impl ReconcileOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A computed pass, not yet applied.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    pub outcome: ReconcileOutcome,
    next_known: BTreeSet<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FileSetReconciler {
    known: BTreeSet<PathBuf>,
    state: ReconcilerState,
}

impl Default for FileSetReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSetReconciler {
    pub fn new() -> Self {
        Self {
            known: BTreeSet::new(),
            state: ReconcilerState::Idle,
        }
    }

    pub fn known(&self) -> &BTreeSet<PathBuf> {
        &self.known
    }

    pub fn is_known(&self, path: &Path) -> bool {
        self.known.contains(&normalize_path(path))
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn clear(&mut self) {
        self.known.clear();
    }

    /// Record paths the assistant was explicitly told to load.
    pub fn track<'a>(&mut self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        self.known.extend(paths.into_iter().map(|p| normalize_path(p)));
    }

    /// Forget paths the assistant was explicitly told to drop.
    pub fn untrack<'a>(&mut self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        for path in paths {
            self.known.remove(&normalize_path(path));
        }
    }

    /// Diff `current` against the known set.
    ///
    /// Ignore patterns see root-relative display paths. An ignored path
    /// keeps whatever membership it already had: it is neither added nor
    /// dropped, and it never becomes known through a pass.
    pub fn plan(&self, current: &BTreeSet<PathBuf>, root: &Path, matcher: &IgnoreMatcher) -> ReconcilePlan {
        let is_ignored = |path: &PathBuf| matcher.should_ignore(&to_display_path(path, root));
        let mut outcome = ReconcileOutcome::default();

        for path in current.difference(&self.known) {
            if is_ignored(path) {
                outcome.ignored.push(path.clone());
            } else {
                outcome.added.push(path.clone());
            }
        }

        for path in self.known.difference(current) {
            if is_ignored(path) {
                outcome.ignored.push(path.clone());
            } else {
                outcome.removed.push(path.clone());
            }
        }
        outcome.ignored.sort();

        let next_known = current
            .iter()
            .filter(|&path| !is_ignored(path))
            .chain(self.known.iter().filter(|&path| is_ignored(path)))
            .cloned()
            .collect();

        ReconcilePlan { outcome, next_known }
    }

    /// Run one pass: send the batched commands and adopt the new known set.
    pub fn reconcile(
        &mut self,
        current: &BTreeSet<PathBuf>,
        root: &Path,
        matcher: &IgnoreMatcher,
        channel: &mut CommandChannel,
    ) -> ReconcileOutcome {
        self.state = ReconcilerState::Reconciling;
        let ReconcilePlan { outcome, next_known } = self.plan(current, root, matcher);

        if !outcome.added.is_empty() {
            channel.send_with_paths(ADD_COMMAND, &outcome.added);
        }
        if !outcome.removed.is_empty() {
            channel.send_with_paths(DROP_COMMAND, &outcome.removed);
        }

        if outcome.is_empty() {
            debug!("Reconciliation pass found no changes");
        } else {
            info!(
                "Reconciled file set: {} added, {} dropped, {} ignored",
                outcome.added.len(),
                outcome.removed.len(),
                outcome.ignored.len()
            );
        }

        self.known = next_known;
        self.state = ReconcilerState::Idle;
        outcome
    }
}
