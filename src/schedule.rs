/// Cooperative periodic tasks driven by timestamp comparison.
///
/// Nothing here sleeps or spawns: the host loop calls the controller's
/// `tick()`, which asks each [`Periodic`] whether it is due.

/// A task that runs at most once per `interval_ms`.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    interval_ms: u64,
    last_ms: u64,
}

impl Periodic {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: 0,
        }
    }

    /// Restart the period from `now_ms`.
    pub fn stamp(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// True once strictly more than the interval has elapsed since the last stamp.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ms) > self.interval_ms
    }

    /// If due, stamp with `now_ms` and return true.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn last_ms(&self) -> u64 {
        self.last_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
