//! Client-side login attempt throttle
//!
//! Sliding window of attempt timestamps giving the user immediate feedback
//! and sparing the server pointless traffic. Not a security boundary — a
//! page reload resets it — real enforcement lives on the server.

use bridge_traits::time::Clock;
use std::sync::{Arc, Mutex};

/// Sliding-window attempt counter.
pub struct LoginThrottle {
    clock: Arc<dyn Clock>,
    max_attempts: usize,
    window_ms: i64,
    attempts: Mutex<Vec<i64>>,
}

impl LoginThrottle {
    pub fn new(clock: Arc<dyn Clock>, max_attempts: usize, window_ms: i64) -> Self {
        Self {
            clock,
            max_attempts,
            window_ms,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Wait-time message when the window is saturated, else `None`.
    pub fn check(&self) -> Option<String> {
        let now = self.clock.unix_timestamp_millis();
        let mut attempts = self.attempts.lock().unwrap();
        Self::prune(&mut attempts, now, self.window_ms);

        if attempts.len() < self.max_attempts {
            return None;
        }
        let oldest = attempts[0];
        let wait_ms = oldest + self.window_ms - now;
        let wait_secs = (wait_ms + 999) / 1000;
        Some(format!(
            "Too many login attempts. Try again in {} second{}.",
            wait_secs,
            if wait_secs == 1 { "" } else { "s" }
        ))
    }

    /// Record one attempt at the current time.
    pub fn record(&self) {
        let now = self.clock.unix_timestamp_millis();
        let mut attempts = self.attempts.lock().unwrap();
        attempts.push(now);
        Self::prune(&mut attempts, now, self.window_ms);
    }

    // Invariant after prune: every entry lies within [now - window_ms, now].
    fn prune(attempts: &mut Vec<i64>, now: i64, window_ms: i64) {
        attempts.retain(|&t| t > now - window_ms && t <= now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_memory::ManualClock;
    use chrono::Duration;

    fn throttle_at(clock: &Arc<ManualClock>) -> LoginThrottle {
        LoginThrottle::new(Arc::clone(clock) as Arc<dyn Clock>, 3, 60_000)
    }

    #[test]
    fn test_clear_below_limit() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let throttle = throttle_at(&clock);

        throttle.record();
        throttle.record();
        assert!(throttle.check().is_none());
    }

    #[test]
    fn test_saturated_window_reports_wait() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let throttle = throttle_at(&clock);

        for _ in 0..3 {
            throttle.record();
        }
        let message = throttle.check().expect("window should be saturated");
        assert!(message.contains("60 seconds"));
    }

    #[test]
    fn test_window_elapse_clears() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let throttle = throttle_at(&clock);

        for _ in 0..3 {
            throttle.record();
        }
        assert!(throttle.check().is_some());

        clock.advance(Duration::milliseconds(60_001));
        assert!(throttle.check().is_none());
    }

    #[test]
    fn test_wait_shrinks_as_time_passes() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let throttle = throttle_at(&clock);

        for _ in 0..3 {
            throttle.record();
        }
        clock.advance(Duration::milliseconds(45_000));
        let message = throttle.check().expect("still saturated");
        assert!(message.contains("15 seconds"));
    }

    #[test]
    fn test_partial_expiry_reopens_window() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let throttle = throttle_at(&clock);

        throttle.record();
        clock.advance(Duration::milliseconds(30_000));
        throttle.record();
        throttle.record();
        assert!(throttle.check().is_some());

        // First attempt ages out; two remain inside the window.
        clock.advance(Duration::milliseconds(30_001));
        assert!(throttle.check().is_none());
    }
}
