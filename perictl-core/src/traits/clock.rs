//! Time source trait

use crate::units::Timestamp;

/// Source of timestamps for readings
///
/// Supplied by the platform: a monotonic timer on an MCU, the system clock
/// on Linux, a fixed value in tests.
pub trait Clock {
    /// Current time
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        C::now(self)
    }
}
