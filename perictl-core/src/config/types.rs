//! Configuration type definitions
//!
//! These types describe which peripherals are attached and how. Defaults
//! match a Raspberry Pi wiring with a PCA9685 at 0x40, a DS18B20 on the
//! 1-Wire bus, a relay on BCM 17 and an HC-SR04 on BCM 23/24.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::pulse::PulseConverter;
use crate::retry::RetryPolicy;

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum 1-Wire device id length (e.g. "28-00000a1b2c3d")
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// Number of PWM channels on a PCA9685
pub const PWM_CHANNELS: u8 = 16;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO line number (BCM numbering on a Raspberry Pi)
    pub pin: u8,
    /// Pin is active-low (inverted)
    #[cfg_attr(feature = "serde", serde(default))]
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Servo on a PCA9685 channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServoConfig {
    /// 7-bit I2C address of the PCA9685
    pub i2c_address: u8,
    /// PWM channel (0-15)
    pub channel: u8,
    /// PWM frequency in Hz
    pub frequency_hz: u32,
    /// Largest accepted angle in degrees
    pub max_angle: f32,
    /// Pulse width at 0° (µs)
    pub min_pulse_us: u32,
    /// Pulse width at `max_angle` (µs)
    pub max_pulse_us: u32,
    /// Duty steps per period
    pub resolution: u32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            i2c_address: 0x40,
            channel: 0,
            frequency_hz: 50,
            max_angle: 90.0,
            min_pulse_us: 1000,
            max_pulse_us: 2000,
            resolution: 65_536,
        }
    }
}

impl ServoConfig {
    /// Build the pulse converter described by this config
    pub fn converter(&self) -> Result<PulseConverter, ConfigError> {
        PulseConverter::with_frequency(
            self.max_angle,
            self.min_pulse_us,
            self.max_pulse_us,
            self.frequency_hz,
            self.resolution,
        )
    }

    /// Validate channel and pulse parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel >= PWM_CHANNELS {
            return Err(ConfigError::InvalidChannel);
        }
        if self.i2c_address > 0x7F {
            return Err(ConfigError::InvalidAddress);
        }
        self.converter().map(|_| ())
    }
}

/// 1-Wire thermometer (DS18B20)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThermometerConfig {
    /// Device id; `None` picks the first thermometer found
    pub device_id: Option<String<MAX_DEVICE_ID_LEN>>,
    /// Accept the 85°C power-on value as a real reading
    pub accept_reset_value: bool,
    /// Retry policy for reads
    pub retry: RetryPolicy,
}

impl Default for ThermometerConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            accept_reset_value: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Relay on a GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RelayConfig {
    /// Control pin (inverted = relay energized when the pin is low)
    pub pin: PinConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            pin: PinConfig::new(17),
        }
    }
}

/// HC-SR04 ultrasonic ranger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RangerConfig {
    /// Trigger pin
    pub trigger_pin: u8,
    /// Echo pin
    pub echo_pin: u8,
    /// Samples per averaged measurement
    pub samples: u8,
    /// Delay between samples (ms)
    pub sample_delay_ms: u32,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            trigger_pin: 23,
            echo_pin: 24,
            samples: 5,
            sample_delay_ms: 100,
        }
    }
}

/// Complete peripheral configuration
///
/// Each peripheral is optional; absent sections are simply not wired.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PeripheralConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Servo on the PWM expander
    pub servo: Option<ServoConfig>,
    /// 1-Wire thermometer
    pub thermometer: Option<ThermometerConfig>,
    /// GPIO relay
    pub relay: Option<RelayConfig>,
    /// Ultrasonic ranger
    pub ranger: Option<RangerConfig>,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            servo: None,
            thermometer: None,
            relay: None,
            ranger: None,
        }
    }
}

impl PeripheralConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every configured peripheral and the pin assignment
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        if let Some(servo) = &self.servo {
            servo.validate()?;
        }

        if let Some(ranger) = &self.ranger {
            if ranger.samples == 0 {
                return Err(ConfigError::InvalidSampleCount);
            }
            if ranger.trigger_pin == ranger.echo_pin {
                return Err(ConfigError::PinConflict);
            }
        }

        if let (Some(relay), Some(ranger)) = (&self.relay, &self.ranger) {
            if relay.pin.pin == ranger.trigger_pin || relay.pin.pin == ranger.echo_pin {
                return Err(ConfigError::PinConflict);
            }
        }

        Ok(())
    }
}
