//! Board-agnostic core logic for the perictl peripheral drivers
//!
//! This crate contains everything that does not touch a concrete bus:
//!
//! - Angle to pulse width to PWM duty conversion
//! - Driver traits (actuator, sensor, switch, clock, cleanup)
//! - Retry policy as a resumable state machine
//! - Device handle ownership and scope-bound release
//! - Configuration type definitions and persistence

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod handle;
pub mod pulse;
pub mod reading;
pub mod retry;
pub mod traits;
pub mod units;

pub use handle::{DeviceHandle, Scoped};
pub use pulse::{angle_to_duty, ConversionError, OutOfRange, PulseConverter};
pub use reading::Reading;
pub use retry::{Exhausted, RetryError, RetryPolicy, RetrySequence, RetryState, RetryStep};
pub use units::{Angle, DutyValue, PulseWidth, Temperature, Timestamp};
