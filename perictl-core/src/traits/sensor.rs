//! Single-attempt sensor trait

use core::fmt;

use perictl_hal::BusErrorKind;

use crate::reading::Reading;

/// Errors from a single sensor read
///
/// Everything except [`SensorError::Released`] is transient: the same read
/// may succeed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device path or address is absent
    DeviceNotFound,
    /// Data arrived but is not a valid temperature
    MalformedData,
    /// Device did not respond within the platform's read window
    IoTimeout,
    /// Other transport failure
    BusFault,
    /// The sensor has been cleaned up; no read can succeed
    Released,
}

impl SensorError {
    /// Check if retrying the read might help
    pub fn is_transient(&self) -> bool {
        !matches!(self, SensorError::Released)
    }
}

impl From<BusErrorKind> for SensorError {
    fn from(kind: BusErrorKind) -> Self {
        match kind {
            BusErrorKind::NotFound => SensorError::DeviceNotFound,
            BusErrorKind::Timeout => SensorError::IoTimeout,
            BusErrorKind::Other => SensorError::BusFault,
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SensorError::DeviceNotFound => "device not found",
            SensorError::MalformedData => "malformed data",
            SensorError::IoTimeout => "I/O timeout",
            SensorError::BusFault => "bus fault",
            SensorError::Released => "sensor already released",
        };
        f.write_str(msg)
    }
}

/// Sensor that performs one read per call
///
/// No retries and no state between calls; see
/// [`RetrySequence`](crate::retry::RetrySequence) for the retry policy.
pub trait SensorReader {
    /// Perform exactly one read
    fn read_once(&mut self) -> Result<Reading, SensorError>;
}

impl<S: SensorReader + ?Sized> SensorReader for &mut S {
    fn read_once(&mut self) -> Result<Reading, SensorError> {
        S::read_once(self)
    }
}
