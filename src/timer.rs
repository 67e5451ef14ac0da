// ABOUTME: Single-slot deadline used for debounce and confirmation delays
// Arming replaces any pending deadline, so timers never stack

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub const fn new() -> Self {
        Self { at: None }
    }

    /// Cancel-and-replace: any earlier deadline is forgotten.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.at = Some(now + delay);
    }

    pub fn cancel(&mut self) -> bool {
        self.at.take().is_some()
    }

    pub fn at(&self) -> Option<Instant> {
        self.at
    }

    pub fn is_pending(&self) -> bool {
        self.at.is_some()
    }

    /// Disarm and return true when the deadline has passed.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.at {
            Some(at) if at <= now => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of the given optional instants.
pub fn earliest(deadlines: &[Option<Instant>]) -> Option<Instant> {
    deadlines.iter().flatten().min().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_replaces_pending_deadline() {
        let start = Instant::now();
        let mut deadline = Deadline::new();
        deadline.arm(start, Duration::from_millis(300));
        deadline.arm(start + Duration::from_millis(200), Duration::from_millis(300));

        assert!(!deadline.take_if_due(start + Duration::from_millis(300)));
        assert!(deadline.take_if_due(start + Duration::from_millis(500)));
        assert!(!deadline.is_pending());
    }

    #[test]
    fn test_earliest_skips_empty_slots() {
        let now = Instant::now();
        let later = now + Duration::from_secs(1);
        assert_eq!(earliest(&[None, Some(later), Some(now)]), Some(now));
        assert_eq!(earliest(&[None, None]), None);
    }
}
