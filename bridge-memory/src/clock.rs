//! Manually advanced clock

use bridge_traits::time::Clock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A [`Clock`] whose time only moves when the test says so
///
/// Backed by an atomic epoch-millisecond counter so it can be shared across
/// tasks without locking.
#[derive(Clone)]
pub struct ManualClock {
    now_millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at the given epoch-millisecond instant
    pub fn at_millis(millis: i64) -> Self {
        Self {
            now_millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    /// Create a clock frozen at the current system time
    pub fn at_system_now() -> Self {
        Self::at_millis(Utc::now().timestamp_millis())
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now_millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Jump the clock to an absolute epoch-millisecond instant
    pub fn set_millis(&self, millis: i64) {
        self.now_millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.now_millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }
}
