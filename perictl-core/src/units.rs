//! Physical quantities passed between drivers and callers
//!
//! Newtypes keep degrees, microseconds and raw duty counts from being mixed
//! up at call sites.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Servo angle in degrees
///
/// Whether an angle is acceptable depends on the actuator; see
/// [`PulseConverter`](crate::pulse::PulseConverter).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angle(f32);

impl Angle {
    /// Create an angle from degrees
    pub const fn from_degrees(degrees: f32) -> Self {
        Self(degrees)
    }

    /// Get the angle in degrees
    pub const fn degrees(self) -> f32 {
        self.0
    }
}

impl From<f32> for Angle {
    fn from(degrees: f32) -> Self {
        Self(degrees)
    }
}

impl From<u8> for Angle {
    fn from(degrees: u8) -> Self {
        Self(degrees as f32)
    }
}

/// High time of one PWM period, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseWidth(f32);

impl PulseWidth {
    /// Create a pulse width from microseconds
    pub const fn from_micros(micros: f32) -> Self {
        Self(micros)
    }

    /// Get the pulse width in microseconds
    pub const fn micros(self) -> f32 {
        self.0
    }
}

/// Duty cycle in the PWM peripheral's native resolution
///
/// Always in `[0, resolution - 1]` when produced by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyValue(pub u32);

impl DutyValue {
    /// Output held low for the whole period
    pub const OFF: DutyValue = DutyValue(0);

    /// Get the raw duty count
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Temperature as signed fixed point, millidegrees Celsius
///
/// 23.125°C is stored as 23125. Fixed point keeps the sensor path free of
/// floating point on MCUs without an FPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Temperature(i32);

impl Temperature {
    /// Create from millidegrees Celsius
    pub const fn from_millidegrees(millidegrees: i32) -> Self {
        Self(millidegrees)
    }

    /// Create from whole degrees Celsius
    pub const fn from_degrees(degrees: i16) -> Self {
        Self(degrees as i32 * 1000)
    }

    /// Create from a raw 1/16 °C register value (DS18B20 12-bit format)
    ///
    /// The half-millidegree of odd raw values is truncated toward zero.
    pub const fn from_sixteenths(raw: i16) -> Self {
        Self(raw as i32 * 125 / 2)
    }

    /// Get the value in millidegrees Celsius
    pub const fn millidegrees(self) -> i32 {
        self.0
    }

    /// Get the value in degrees Celsius
    pub fn celsius(self) -> f32 {
        self.0 as f32 / 1000.0
    }
}

/// Formats as degrees Celsius with two decimals, e.g. `25.50°C`
///
/// The third decimal rounds half away from zero.
impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let milli = self.0 as i64;
        let centi = if milli >= 0 {
            (milli + 5) / 10
        } else {
            (milli - 5) / 10
        };
        let sign = if centi < 0 { "-" } else { "" };
        let abs = centi.unsigned_abs();
        write!(f, "{}{}.{:02}°C", sign, abs / 100, abs % 100)
    }
}

/// Point in time, microseconds since the clock's epoch
///
/// The epoch is whatever the [`Clock`](crate::traits::Clock) uses: boot for
/// an MCU timer, the Unix epoch for a system clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create from microseconds since the epoch
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Microseconds since the epoch
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole milliseconds since the epoch
    pub const fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    /// Whole seconds since the epoch
    pub const fn as_secs(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Microseconds elapsed since `earlier` (zero if `earlier` is later)
    pub const fn micros_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_temperature_display() {
        assert_eq!(format!("{}", Temperature::from_millidegrees(25_500)), "25.50°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(23_125)), "23.13°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(-10_062)), "-10.06°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(-10_065)), "-10.07°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(5)), "0.01°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(-4)), "0.00°C");
        assert_eq!(format!("{}", Temperature::from_millidegrees(0)), "0.00°C");
    }

    #[test]
    fn test_temperature_from_sixteenths() {
        // Datasheet examples
        assert_eq!(Temperature::from_sixteenths(0x07D0).millidegrees(), 125_000);
        assert_eq!(Temperature::from_sixteenths(0x0191).millidegrees(), 25_062);
        assert_eq!(Temperature::from_sixteenths(0x0008).millidegrees(), 500);
        assert_eq!(Temperature::from_sixteenths(-2).millidegrees(), -125);
        assert_eq!(Temperature::from_sixteenths(-0x0370).millidegrees(), -55_000);
    }

    #[test]
    fn test_temperature_conversions() {
        let t = Temperature::from_degrees(-12);
        assert_eq!(t.millidegrees(), -12_000);
        assert_eq!(t.celsius(), -12.0);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let a = Timestamp::from_micros(1_500_000);
        let b = Timestamp::from_micros(4_250_000);

        assert_eq!(b.micros_since(a), 2_750_000);
        assert_eq!(a.micros_since(b), 0);
        assert_eq!(b.as_millis(), 4_250);
        assert_eq!(b.as_secs(), 4);
    }
}
