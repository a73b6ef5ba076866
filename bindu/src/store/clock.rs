//! Time sources for store timestamps.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;

/// Source of "now" for everything the store timestamps.
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic timestamps.
///
/// Every call to [`now`](Clock::now) returns the current instant and then
/// advances it by `step` (zero by default).
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<(DateTime<Utc>, Duration)>,
}

impl ManualClock {
    /// Clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new((start, Duration::zero())),
        }
    }

    /// Clock that ticks forward by `step` on every read
    pub fn stepping(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            state: Mutex::new((start, step)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        state.0 += by;
    }

    /// Jump to a specific instant
    pub fn set(&self, at: DateTime<Utc>) {
        self.state.lock().0 = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut state = self.state.lock();
        let current = state.0;
        state.0 = current + state.1;
        current
    }
}

/// Stored timestamp format: RFC 3339, UTC, microsecond precision.
///
/// Fixed width, so lexical order equals chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
