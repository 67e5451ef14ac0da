// ABOUTME: File-set reconciliation between editor documents and the assistant's context
// Tracks which files the assistant is believed to hold and emits batched /add and /drop

pub mod document;
pub mod reconciler;

pub use document::{EditorDocument, OpenDocuments, FILE_SCHEME};
pub use reconciler::{FileSetReconciler, ReconcileOutcome, ReconcilePlan, ReconcilerState};
