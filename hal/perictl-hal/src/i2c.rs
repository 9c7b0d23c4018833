//! I2C bus abstractions
//!
//! Provides the I2C master trait used by register-level drivers (the
//! PCA9685 PWM expander). Every embedded-hal 1.0 I2C bus implements it.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::bus::{BusError, BusErrorKind};

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error: BusError;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Error from an embedded-hal I2C bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cError<E>(pub E);

impl<E: embedded_hal::i2c::Error> BusError for I2cError<E> {
    fn kind(&self) -> BusErrorKind {
        match self.0.kind() {
            // Nobody answered the address byte: the device is not there
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusErrorKind::NotFound,
            _ => BusErrorKind::Other,
        }
    }
}

impl<T: embedded_hal::i2c::I2c> I2cBus for T {
    type Error = I2cError<T::Error>;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write(self, address, data).map_err(I2cError)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::read(self, address, buf).map_err(I2cError)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write_read(self, address, write_data, read_buf).map_err(I2cError)
    }
}
