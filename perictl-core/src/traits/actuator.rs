//! Positional actuator trait

use core::fmt;

use perictl_hal::BusErrorKind;

use crate::pulse::OutOfRange;
use crate::units::{Angle, DutyValue};

/// Errors that can occur when positioning an actuator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Angle outside the configured domain; nothing was written
    OutOfRange(OutOfRange),
    /// The bus rejected the duty write (not retried)
    BusWriteFailed(BusErrorKind),
    /// The driver has been cleaned up; nothing was written
    Released,
}

impl ActuatorError {
    /// Check if the same call might succeed later
    ///
    /// Only bus faults are transient. A bad angle or a released driver will
    /// fail the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, ActuatorError::BusWriteFailed(_))
    }
}

impl From<OutOfRange> for ActuatorError {
    fn from(e: OutOfRange) -> Self {
        ActuatorError::OutOfRange(e)
    }
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorError::OutOfRange(e) => e.fmt(f),
            ActuatorError::BusWriteFailed(kind) => write!(f, "bus write failed ({:?})", kind),
            ActuatorError::Released => f.write_str("driver already released"),
        }
    }
}

/// Actuator positioned by angle
///
/// Each successful `set_angle` moves the physical actuator. Calls take
/// `&mut self`, so one driver never has two writes in flight.
pub trait ActuatorDriver {
    /// Move to an angle
    ///
    /// Validates and converts the angle, then issues exactly one bus write.
    /// Returns the duty value written.
    fn set_angle(&mut self, angle: Angle) -> Result<DutyValue, ActuatorError>;

    /// Duty value of the last successful write (diagnostics)
    fn last_duty(&self) -> Option<DutyValue>;
}
