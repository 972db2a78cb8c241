use std::time::{Duration, Instant};

/// Single-slot deferral for rebuild requests.
///
/// Each request pushes the deadline out to `now + window`; a burst of edits
/// therefore produces one rebuild once input goes quiet. Time is passed in,
/// so the caller decides what clock drives it.
#[derive(Debug, Clone)]
pub struct RebuildScheduler {
    window: Duration,
    deadline: Option<Instant>,
}

impl RebuildScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule a rebuild, replacing any pending one.
    pub fn request(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the pending rebuild is due.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// True exactly once per pending request, when its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
