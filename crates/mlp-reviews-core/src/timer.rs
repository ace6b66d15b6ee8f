//! Deadline-based debounce timer.
//!
//! The owner drives the timer with explicit millisecond timestamps: every
//! input calls [`DebounceTimer::reset`], and the event loop calls
//! [`DebounceTimer::fire_if_due`] on each tick. There is at most one pending
//! deadline, so rapid input never accumulates timers.

/// Cancellable single-shot debounce timer.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay_ms: u64,
    deadline_ms: Option<u64>,
}

impl DebounceTimer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline_ms: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Restart the quiet period from `now_ms`, replacing any pending deadline.
    pub fn reset(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Consume the deadline if it has passed. Returns true exactly once per
    /// quiet period.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_quiet_period() {
        let mut t = DebounceTimer::new(1000);
        t.reset(0);
        assert!(!t.fire_if_due(999));
        assert!(t.fire_if_due(1000));
        assert!(!t.fire_if_due(5000));
    }

    #[test]
    fn test_reset_pushes_deadline() {
        let mut t = DebounceTimer::new(1000);
        t.reset(0);
        t.reset(800);
        assert!(!t.fire_if_due(1500));
        assert!(t.fire_if_due(1800));
    }

    #[test]
    fn test_cancel() {
        let mut t = DebounceTimer::new(10);
        t.reset(0);
        t.cancel();
        assert!(!t.is_pending());
        assert!(!t.fire_if_due(100));
    }
}
