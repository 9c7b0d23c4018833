//! Temperature reading value
//!
//! A reading is created by a successful sensor read and never modified
//! afterwards. How it is displayed or stored is up to the caller.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::units::{Temperature, Timestamp};

/// A temperature measured at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    temperature: Temperature,
    timestamp: Timestamp,
}

impl Reading {
    /// Create a reading
    pub const fn new(temperature: Temperature, timestamp: Timestamp) -> Self {
        Self {
            temperature,
            timestamp,
        }
    }

    /// Measured temperature
    pub const fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// When the measurement was taken
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}
