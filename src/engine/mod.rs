// ABOUTME: The reconciliation engine and the event loop that drives it
// One engine instance owns the session, known set, ignore source and timers

pub mod state;
pub mod events;
pub mod runtime;

pub use state::{CloseReason, DebugReport, ReconciliationEngine};
pub use events::BridgeEvent;
pub use runtime::{EngineRuntime, RuntimeHandle};
