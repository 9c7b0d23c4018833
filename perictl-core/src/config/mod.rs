//! Configuration types
//!
//! Board-agnostic peripheral configuration. With the `serde` feature the
//! configuration can be persisted as postcard binary data; with the `toml`
//! feature it can be read from a TOML document.

use core::fmt;

#[cfg(feature = "serde")]
pub mod persist;
#[cfg(feature = "toml")]
pub mod toml;
pub mod types;

#[cfg(feature = "serde")]
pub use persist::{from_bytes, to_slice};
#[cfg(feature = "toml")]
pub use self::toml::from_toml_str;
pub use types::*;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Maximum angle is not a positive finite number
    InvalidAngleRange,
    /// Minimum pulse width is not below the maximum
    InvalidPulseRange,
    /// PWM period is zero or shorter than the maximum pulse
    InvalidPeriod,
    /// Duty resolution is zero
    InvalidResolution,
    /// PWM channel does not exist on the expander
    InvalidChannel,
    /// I2C address does not fit in 7 bits
    InvalidAddress,
    /// Averaging needs at least one sample
    InvalidSampleCount,
    /// Two peripherals claim the same GPIO line
    PinConflict,
    /// Config version mismatch
    VersionMismatch,
    /// TOML document could not be parsed
    TomlParse,
    /// Binary serialization failed (buffer too small)
    Serialize,
    /// Binary deserialization failed
    Deserialize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::InvalidAngleRange => "max angle must be positive and finite",
            ConfigError::InvalidPulseRange => "min pulse width must be below max pulse width",
            ConfigError::InvalidPeriod => "PWM period must cover the max pulse width",
            ConfigError::InvalidResolution => "duty resolution must be non-zero",
            ConfigError::InvalidChannel => "PWM channel out of range",
            ConfigError::InvalidAddress => "I2C address must be 7-bit",
            ConfigError::InvalidSampleCount => "sample count must be non-zero",
            ConfigError::PinConflict => "GPIO line assigned twice",
            ConfigError::VersionMismatch => "unsupported config version",
            ConfigError::TomlParse => "invalid TOML configuration",
            ConfigError::Serialize => "config does not fit in buffer",
            ConfigError::Deserialize => "corrupt binary config",
        };
        f.write_str(msg)
    }
}
