//! Servo angle to PWM duty conversion
//!
//! A hobby servo reads the high time of each PWM period as a target
//! position. The conversion is a linear interpolation from angle to pulse
//! width, followed by a scaling of pulse width to the PWM peripheral's
//! duty resolution:
//!
//! ```text
//! pulse_us = min_us + (angle / max_angle) * (max_us - min_us)
//! duty     = floor(pulse_us * resolution / period_us)   (clamped to resolution - 1)
//! ```
//!
//! Angles outside `[0, max_angle]` are rejected, never clamped, so a caller
//! bug cannot silently turn into a valid-looking position.

use core::fmt;

use crate::config::ConfigError;
use crate::units::{Angle, DutyValue, PulseWidth};

/// Requested angle is outside the actuator's domain
///
/// This is an input error: retrying the same call can never succeed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange {
    /// The rejected angle
    pub angle: Angle,
    /// Largest accepted angle (the smallest is always 0)
    pub max_angle: f32,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "angle {} is outside 0..={} degrees",
            self.angle.degrees(),
            self.max_angle
        )
    }
}

/// Validated angle → pulse → duty mapping for one servo model
///
/// Pure and `Copy`; share it freely between threads.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseConverter {
    max_angle: f32,
    min_pulse_us: u32,
    max_pulse_us: u32,
    period_us: u32,
    resolution: u32,
}

impl PulseConverter {
    /// SG90 over a 90° travel: 1.0–2.0 ms at 50 Hz, 16-bit duty
    pub const SG90: PulseConverter = PulseConverter {
        max_angle: 90.0,
        min_pulse_us: 1000,
        max_pulse_us: 2000,
        period_us: 20_000,
        resolution: 65_536,
    };

    /// SG90 over its full 180° travel: 0.5–2.5 ms at 50 Hz, 16-bit duty
    pub const SG90_WIDE: PulseConverter = PulseConverter {
        max_angle: 180.0,
        min_pulse_us: 500,
        max_pulse_us: 2500,
        period_us: 20_000,
        resolution: 65_536,
    };

    /// Create a converter, validating the parameters
    ///
    /// # Arguments
    /// - `max_angle`: Largest accepted angle in degrees (> 0)
    /// - `min_pulse_us`: Pulse width at 0° (< `max_pulse_us`)
    /// - `max_pulse_us`: Pulse width at `max_angle` (<= `period_us`)
    /// - `period_us`: PWM period (> 0)
    /// - `resolution`: Number of duty steps per period (> 0)
    pub fn new(
        max_angle: f32,
        min_pulse_us: u32,
        max_pulse_us: u32,
        period_us: u32,
        resolution: u32,
    ) -> Result<Self, ConfigError> {
        if !(max_angle.is_finite() && max_angle > 0.0) {
            return Err(ConfigError::InvalidAngleRange);
        }
        if min_pulse_us >= max_pulse_us {
            return Err(ConfigError::InvalidPulseRange);
        }
        if period_us == 0 || max_pulse_us > period_us {
            return Err(ConfigError::InvalidPeriod);
        }
        if resolution == 0 {
            return Err(ConfigError::InvalidResolution);
        }

        Ok(Self {
            max_angle,
            min_pulse_us,
            max_pulse_us,
            period_us,
            resolution,
        })
    }

    /// Create a converter from a PWM frequency instead of a period
    pub fn with_frequency(
        max_angle: f32,
        min_pulse_us: u32,
        max_pulse_us: u32,
        frequency_hz: u32,
        resolution: u32,
    ) -> Result<Self, ConfigError> {
        if frequency_hz == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        Self::new(
            max_angle,
            min_pulse_us,
            max_pulse_us,
            1_000_000 / frequency_hz,
            resolution,
        )
    }

    /// Largest accepted angle in degrees
    pub const fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// Pulse width range in microseconds
    pub const fn pulse_range_us(&self) -> (u32, u32) {
        (self.min_pulse_us, self.max_pulse_us)
    }

    /// PWM period in microseconds
    pub const fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Duty steps per period
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Check that an angle lies in `[0, max_angle]`
    ///
    /// NaN is never in range.
    pub fn validate(&self, angle: Angle) -> Result<(), OutOfRange> {
        let degrees = angle.degrees();
        if degrees >= 0.0 && degrees <= self.max_angle {
            Ok(())
        } else {
            Err(OutOfRange {
                angle,
                max_angle: self.max_angle,
            })
        }
    }

    /// Interpolate the pulse width for an angle
    pub fn angle_to_pulse(&self, angle: Angle) -> Result<PulseWidth, OutOfRange> {
        self.validate(angle)?;

        let fraction = angle.degrees() as f64 / self.max_angle as f64;
        let span = (self.max_pulse_us - self.min_pulse_us) as f64;
        let pulse = self.min_pulse_us as f64 + fraction * span;

        Ok(PulseWidth::from_micros(pulse as f32))
    }

    /// Scale a pulse width to a duty value
    ///
    /// Rounds down and clamps to `[0, resolution - 1]`.
    pub fn pulse_to_duty(&self, pulse: PulseWidth) -> DutyValue {
        // Multiply before dividing so integral results stay exact
        let raw = pulse.micros() as f64 * self.resolution as f64 / self.period_us as f64;
        let top = self.resolution.saturating_sub(1);

        // `as` saturates: negatives and NaN become 0, huge values u64::MAX
        let floored = raw as u64;
        DutyValue(floored.min(top as u64) as u32)
    }

    /// Convert an angle straight to a duty value
    pub fn angle_to_duty(&self, angle: Angle) -> Result<DutyValue, OutOfRange> {
        let pulse = self.angle_to_pulse(angle)?;
        Ok(self.pulse_to_duty(pulse))
    }
}

/// Failure of a one-shot [`angle_to_duty`] call
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionError {
    /// Servo profile is invalid (caller bug in the parameters)
    InvalidParameters(ConfigError),
    /// Angle is outside the profile's domain
    OutOfRange(OutOfRange),
}

impl From<ConfigError> for ConversionError {
    fn from(e: ConfigError) -> Self {
        ConversionError::InvalidParameters(e)
    }
}

impl From<OutOfRange> for ConversionError {
    fn from(e: OutOfRange) -> Self {
        ConversionError::OutOfRange(e)
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::InvalidParameters(e) => write!(f, "invalid servo profile: {}", e),
            ConversionError::OutOfRange(e) => e.fmt(f),
        }
    }
}

/// One-shot conversion without building a [`PulseConverter`] first
///
/// The parameters go through [`PulseConverter::new`] on every call; build
/// a converter once when converting repeatedly.
pub fn angle_to_duty(
    angle: Angle,
    min_pulse_us: u32,
    max_pulse_us: u32,
    period_us: u32,
    resolution: u32,
    max_angle: f32,
) -> Result<DutyValue, ConversionError> {
    let converter = PulseConverter::new(max_angle, min_pulse_us, max_pulse_us, period_us, resolution)?;
    Ok(converter.angle_to_duty(angle)?)
}
