//! Exponential backoff state for the supervisor loop.

use std::time::Duration;

/// The delay applied between retries after a run-level failure.
///
/// Owned by the supervisor and threaded through its iterations; nothing
/// else mutates it. Resets to the floor after any clean run, doubles
/// (capped at the ceiling) after any faulted one.
#[derive(Debug, Clone)]
pub struct BackoffState {
    current: Duration,
    floor: Duration,
    ceiling: Duration,
}

impl BackoffState {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            current: floor,
            floor,
            ceiling,
        }
    }

    /// The delay the next failure would wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// A run completed without an uncaught fault; drop back to the floor.
    pub fn note_success(&mut self) {
        self.current = self.floor;
    }

    /// A run faulted: returns the delay to wait now and doubles the state
    /// for next time, capped at the ceiling.
    pub fn note_failure(&mut self) -> Duration {
        let delay = self.current.min(self.ceiling);
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn starts_at_the_floor() {
        let backoff = BackoffState::new(secs(5), secs(300));
        assert_eq!(backoff.current(), secs(5));
    }

    #[test]
    fn doubles_on_consecutive_failures() {
        let mut backoff = BackoffState::new(secs(5), secs(300));
        assert_eq!(backoff.note_failure(), secs(5));
        assert_eq!(backoff.note_failure(), secs(10));
        assert_eq!(backoff.note_failure(), secs(20));
        assert_eq!(backoff.note_failure(), secs(40));
    }

    #[test]
    fn never_exceeds_the_ceiling() {
        let mut backoff = BackoffState::new(secs(100), secs(300));
        assert_eq!(backoff.note_failure(), secs(100));
        assert_eq!(backoff.note_failure(), secs(200));
        assert_eq!(backoff.note_failure(), secs(300));
        // Pinned at the ceiling from here on.
        assert_eq!(backoff.note_failure(), secs(300));
        assert_eq!(backoff.note_failure(), secs(300));
    }

    #[test]
    fn success_resets_to_the_floor() {
        let mut backoff = BackoffState::new(secs(5), secs(300));
        backoff.note_failure();
        backoff.note_failure();
        assert_eq!(backoff.current(), secs(20));
        backoff.note_success();
        assert_eq!(backoff.current(), secs(5));
        assert_eq!(backoff.note_failure(), secs(5));
    }
}
