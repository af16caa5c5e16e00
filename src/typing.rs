use crate::scheduler::{CoalescingScheduler, TimerKind};

/// Tracks whether content keys were pressed recently.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    quiet_ms: u64,
    is_typing: bool,
    last_typing_ms: Option<u64>,
}

impl TypingTracker {
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            is_typing: false,
            last_typing_ms: None,
        }
    }

    pub fn start_typing(&mut self, now_ms: u64, sched: &mut CoalescingScheduler) {
        self.is_typing = true;
        self.last_typing_ms = Some(now_ms);
        sched.cancel(TimerKind::TypingStop);
    }

    pub fn stop_typing(&mut self, now_ms: u64, sched: &mut CoalescingScheduler) {
        sched.schedule(TimerKind::TypingStop, now_ms.saturating_add(self.quiet_ms));
    }

    /// Called when the `TypingStop` timer fires.
    pub fn on_stop_timer(&mut self, now_ms: u64) {
        let quiet = self
            .last_typing_ms
            .map(|last| now_ms.saturating_sub(last) >= self.quiet_ms)
            .unwrap_or(true);
        if quiet {
            self.is_typing = false;
        }
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn last_typing_ms(&self) -> Option<u64> {
        self.last_typing_ms
    }

    /// True if a content key was pressed less than `window_ms` before `now_ms`.
    pub fn pressed_within(&self, now_ms: u64, window_ms: u64) -> bool {
        self.last_typing_ms
            .map(|last| now_ms.saturating_sub(last) < window_ms)
            .unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.is_typing = false;
        self.last_typing_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_due(tracker: &mut TypingTracker, sched: &mut CoalescingScheduler, now: u64) {
        while let Some((kind, due)) = sched.pop_due(now) {
            assert_eq!(kind, TimerKind::TypingStop);
            tracker.on_stop_timer(due);
        }
    }

    #[test]
    fn clears_after_quiet_period() {
        let mut sched = CoalescingScheduler::new();
        let mut tracker = TypingTracker::new(300);

        tracker.start_typing(0, &mut sched);
        tracker.stop_typing(0, &mut sched);
        fire_due(&mut tracker, &mut sched, 299);
        assert!(tracker.is_typing());

        fire_due(&mut tracker, &mut sched, 300);
        assert!(!tracker.is_typing());
    }

    #[test]
    fn new_keystroke_cancels_pending_stop() {
        let mut sched = CoalescingScheduler::new();
        let mut tracker = TypingTracker::new(300);

        tracker.start_typing(0, &mut sched);
        tracker.stop_typing(0, &mut sched);
        tracker.start_typing(200, &mut sched);
        assert!(!sched.is_pending(TimerKind::TypingStop));

        fire_due(&mut tracker, &mut sched, 10_000);
        assert!(tracker.is_typing());

        tracker.stop_typing(200, &mut sched);
        fire_due(&mut tracker, &mut sched, 499);
        assert!(tracker.is_typing());
        fire_due(&mut tracker, &mut sched, 500);
        assert!(!tracker.is_typing());
    }

    #[test]
    fn recent_press_window_is_exclusive() {
        let mut sched = CoalescingScheduler::new();
        let mut tracker = TypingTracker::new(300);
        assert!(!tracker.pressed_within(0, 500));

        tracker.start_typing(1000, &mut sched);
        assert_eq!(tracker.last_typing_ms(), Some(1000));
        assert!(tracker.pressed_within(1499, 500));
        assert!(!tracker.pressed_within(1500, 500));
    }
}
