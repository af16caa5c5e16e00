use std::collections::BTreeMap;

/// The deferred actions the controller can have outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    TypingStop,
    BlurDismiss,
    Refocus,
    FocusRetry,
}

/// Holds at most one pending deadline per kind. Scheduling a kind again
/// replaces its previous deadline.
#[derive(Debug, Clone, Default)]
pub struct CoalescingScheduler {
    pending: BTreeMap<TimerKind, u64>,
}

impl CoalescingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, due_ms: u64) {
        self.pending.insert(kind, due_ms);
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.pending.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    pub fn due_at(&self, kind: TimerKind) -> Option<u64> {
        self.pending.get(&kind).copied()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.values().copied().min()
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    ///
    /// Ties are broken by `TimerKind` order so replay is deterministic.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerKind, u64)> {
        let (kind, due) = self
            .pending
            .iter()
            .map(|(kind, due)| (*kind, *due))
            .filter(|&(_, due)| due <= now_ms)
            .min_by_key(|&(kind, due)| (due, kind))?;
        self.pending.remove(&kind);
        Some((kind, due))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescheduling_replaces_the_previous_deadline() {
        let mut sched = CoalescingScheduler::new();
        sched.schedule(TimerKind::Refocus, 100);
        sched.schedule(TimerKind::Refocus, 180);

        assert_eq!(sched.len(), 1);
        assert_eq!(sched.pop_due(150), None);
        assert_eq!(sched.pop_due(180), Some((TimerKind::Refocus, 180)));
        assert!(sched.is_empty());
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut sched = CoalescingScheduler::new();
        sched.schedule(TimerKind::BlurDismiss, 300);
        sched.schedule(TimerKind::FocusRetry, 150);
        sched.schedule(TimerKind::TypingStop, 300);

        assert_eq!(sched.next_deadline(), Some(150));
        assert_eq!(sched.pop_due(1000), Some((TimerKind::FocusRetry, 150)));
        assert_eq!(sched.pop_due(1000), Some((TimerKind::TypingStop, 300)));
        assert_eq!(sched.pop_due(1000), Some((TimerKind::BlurDismiss, 300)));
        assert_eq!(sched.pop_due(1000), None);
    }

    #[test]
    fn cancel_reports_whether_anything_was_pending() {
        let mut sched = CoalescingScheduler::new();
        sched.schedule(TimerKind::TypingStop, 10);
        assert!(sched.cancel(TimerKind::TypingStop));
        assert!(!sched.cancel(TimerKind::TypingStop));
    }
}
