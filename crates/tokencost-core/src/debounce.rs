use std::time::Duration;

/// Default pause after the last change before an automatic recalculation.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(650);

/// A single cancellable deadline.
///
/// The debouncer never reads a clock. Callers pass `now` as the time elapsed
/// since any fixed origin (process start, page load, a test's virtual clock)
/// and must keep using the same origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Duration>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a run at `now + delay`, replacing any pending one.
    pub fn arm(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Drop the pending run, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// True once when the pending deadline has passed; disarms on firing.
    pub fn fire(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
