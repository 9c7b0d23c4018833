//! PCA9685 over the Linux i2c-dev interface

use std::path::Path;

use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::{Delay, I2CError, I2cdev};
use perictl_core::config::{ConfigError, ServoConfig};
use perictl_drivers::pwm::{Pca9685, Pca9685Error};
use perictl_hal::I2cError;
use thiserror::Error;

/// Default I2C adapter on a Raspberry Pi (GPIO 2/3)
pub const DEFAULT_ADAPTER: &str = "/dev/i2c-1";

/// PCA9685 on a Linux I2C adapter
pub type LinuxPca9685 = Pca9685<I2cdev>;

/// Errors bringing up a PWM expander
#[derive(Debug, Error)]
pub enum PwmSetupError {
    /// Servo configuration is invalid
    #[error("invalid servo configuration: {0}")]
    Config(ConfigError),

    /// The adapter device could not be opened
    #[error("cannot open I2C adapter: {0}")]
    Open(#[from] LinuxI2CError),

    /// The chip did not accept its setup
    #[error("PCA9685 setup failed: {0:?}")]
    Chip(Pca9685Error<I2cError<I2CError>>),
}

/// Open the adapter at `path` and initialize a PCA9685 for `config`
///
/// The chip is reset to auto-increment mode and set to the configured PWM
/// frequency.
pub fn open_pca9685(
    path: impl AsRef<Path>,
    config: &ServoConfig,
) -> Result<LinuxPca9685, PwmSetupError> {
    config.validate().map_err(PwmSetupError::Config)?;

    let i2c = I2cdev::new(path)?;
    let mut pca = Pca9685::new(i2c, config.i2c_address);
    pca.init(config.frequency_hz, &mut Delay)
        .map_err(PwmSetupError::Chip)?;

    #[cfg(feature = "defmt")]
    defmt::info!(
        "pca9685 at {=u8:#x}: {} Hz",
        config.i2c_address,
        config.frequency_hz
    );

    Ok(pca)
}
