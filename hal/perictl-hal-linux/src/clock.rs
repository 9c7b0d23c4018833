//! Time sources backed by the operating system

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use perictl_core::traits::Clock;
use perictl_core::Timestamp;

/// Wall clock, microseconds since the Unix epoch
///
/// Use for reading timestamps. A clock set before 1970 reads as the epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();
        Timestamp::from_micros(micros)
    }
}

/// Monotonic clock, microseconds since creation
///
/// Use for measuring intervals (echo timing); it never jumps when the
/// wall clock is adjusted.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.start.elapsed().as_micros() as u64)
    }
}
