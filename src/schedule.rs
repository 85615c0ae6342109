//! Fire-once, cancelable timers keyed by name.
//!
//! Every delayed screen change (compliment reveal, entering the ready
//! screen, showing the game-over panel...) is a [`TimerKind`] with a due
//! time. The state machine asks for the timers that came due at the start of
//! each frame, so a timer never fires in the middle of an engine tick.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    RevealCompliment,
    RevealWord,
    EnterReady,
    CameraFallback,
    ClearMessage,
    PhotoTimeout,
    ShowGameOver,
    ShakeBack,
    EndShake,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    timers: Vec<(TimerKind, u64)>,
}

impl Scheduler {
    /// Arm `kind` to fire at `now + delay`. Re-arming replaces the previous
    /// due time.
    pub fn schedule(&mut self, kind: TimerKind, now: u64, delay: u64) {
        self.cancel(kind);
        self.timers.push((kind, now.saturating_add(delay)));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.timers.retain(|(k, _)| *k != kind);
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|(k, _)| *k == kind)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn due(&mut self, now: u64) -> Vec<TimerKind> {
        let (mut fired, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(_, due)| *due <= now);
        self.timers = pending;
        fired.sort_by_key(|(_, due)| *due);
        fired.into_iter().map(|(kind, _)| kind).collect()
    }
}
