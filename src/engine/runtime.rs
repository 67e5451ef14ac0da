// ABOUTME: Async event loop feeding a ReconciliationEngine from a channel
// Wakes on inbound events, the engine's next deadline, and a process-exit poll

use crate::engine::events::BridgeEvent;
use crate::engine::state::ReconciliationEngine;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_EXIT_POLL: Duration = Duration::from_secs(2);

/// Sending side of the runtime's event queue.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl RuntimeHandle {
    /// Returns false once the runtime has stopped.
    pub fn send(&self, event: BridgeEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

pub struct EngineRuntime {
    engine: ReconciliationEngine,
    events: mpsc::UnboundedReceiver<BridgeEvent>,
    exit_poll: Duration,
}

impl EngineRuntime {
    pub fn new(engine: ReconciliationEngine) -> (Self, RuntimeHandle) {
        let (tx, events) = mpsc::unbounded_channel();
        let runtime = Self {
            engine,
            events,
            exit_poll: DEFAULT_EXIT_POLL,
        };
        (runtime, RuntimeHandle { tx })
    }

    pub fn with_exit_poll(mut self, interval: Duration) -> Self {
        self.exit_poll = interval;
        self
    }

    /// Process events until every handle is dropped, then close the session
    /// and hand the engine back.
    pub async fn run(mut self) -> ReconciliationEngine {
        let mut exit_poll = time::interval(self.exit_poll);
        exit_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.engine.next_deadline();
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => {
                        debug!("Handling event: {:?}", event);
                        self.engine.handle(event, Instant::now().into_std());
                    }
                    None => break,
                },
                () = sleep_until(deadline) => {
                    self.engine.fire_due(Instant::now().into_std());
                }
                _ = exit_poll.tick() => {
                    if self.engine.poll_process() {
                        info!("Assistant process exited");
                    }
                }
            }
        }

        info!("Event stream ended, closing session");
        self.engine.close();
        self.engine
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => time::sleep_until(Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
