// ABOUTME: Push-to-talk dictation state machine layered on the command channel
// Release schedules a delayed confirm so a quick re-press keeps the assistant listening

use crate::channel::CommandChannel;
use crate::timer::Deadline;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub const VOICE_COMMAND: &str = "/voice";
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DictationState {
    Idle,
    Armed,
}

#[derive(Debug, Clone)]
pub struct DictationToggle {
    state: DictationState,
    pending_confirm: Deadline,
    delay: Duration,
}

impl Default for DictationToggle {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_DELAY)
    }
}

impl DictationToggle {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: DictationState::Idle,
            pending_confirm: Deadline::new(),
            delay,
        }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending_confirm.at()
    }

    /// Key down. Starts voice mode when idle; while armed, cancels a
    /// pending confirm.
    pub fn press(&mut self, channel: &mut CommandChannel) {
        match self.state {
            DictationState::Idle => {
                channel.send_raw(VOICE_COMMAND);
                self.state = DictationState::Armed;
                debug!("Dictation armed");
            }
            DictationState::Armed => {
                if self.pending_confirm.cancel() {
                    debug!("Dictation re-pressed, confirm cancelled");
                }
            }
        }
    }

    /// Key up. (Re)starts the confirm delay while armed.
    pub fn release(&mut self, now: Instant) {
        if self.state == DictationState::Armed {
            self.pending_confirm.arm(now, self.delay);
        }
    }

    /// Send the confirm if the delay has elapsed. Returns true when sent.
    pub fn fire_due(&mut self, now: Instant, channel: &mut CommandChannel) -> bool {
        if !self.pending_confirm.take_if_due(now) {
            return false;
        }
        channel.send_confirm();
        self.state = DictationState::Idle;
        debug!("Dictation confirmed");
        true
    }

    /// Drop all state without sending anything.
    pub fn reset(&mut self) {
        self.state = DictationState::Idle;
        self.pending_confirm.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{LaunchSpec, Launcher, MemoryHandle, MemoryLauncher};

    fn channel() -> (CommandChannel, MemoryHandle) {
        let mut launcher = MemoryLauncher::new();
        let handle = launcher.handle();
        let spec = LaunchSpec {
            name: "t".to_string(),
            working_directory: "/proj".into(),
            command_line: "aider".to_string(),
            env: Default::default(),
        };
        (CommandChannel::new(launcher.launch(&spec).unwrap(), "/proj"), handle)
    }

    #[test]
    fn test_press_release_confirms_after_delay() {
        let (mut channel, handle) = channel();
        let mut toggle = DictationToggle::default();
        let t0 = Instant::now();

        toggle.press(&mut channel);
        toggle.release(t0);
        assert!(!toggle.fire_due(t0 + Duration::from_millis(499), &mut channel));
        assert!(toggle.fire_due(t0 + Duration::from_millis(500), &mut channel));

        assert_eq!(handle.lines().first().map(String::as_str), Some(VOICE_COMMAND));
        assert_eq!(handle.lines().len(), 2);
        assert_eq!(toggle.state(), DictationState::Idle);
    }

    #[test]
    fn test_repress_cancels_pending_confirm() {
        let (mut channel, handle) = channel();
        let mut toggle = DictationToggle::default();
        let t0 = Instant::now();

        toggle.press(&mut channel);
        toggle.release(t0);
        toggle.press(&mut channel);
        assert!(toggle.deadline().is_none());
        assert!(!toggle.fire_due(t0 + Duration::from_secs(5), &mut channel));
        assert_eq!(handle.lines(), vec![VOICE_COMMAND.to_string()]);
        assert_eq!(toggle.state(), DictationState::Armed);
    }

    #[test]
    fn test_voice_toggle_is_sent_verbatim_with_terminator() {
        let (mut channel, handle) = channel();
        let mut toggle = DictationToggle::default();

        toggle.press(&mut channel);
        let frames = handle.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, VOICE_COMMAND);
        assert!(frames[0].newline);
    }

    #[test]
    fn test_release_while_idle_does_nothing() {
        let mut toggle = DictationToggle::default();
        toggle.release(Instant::now());
        assert!(toggle.deadline().is_none());
    }
}
