//! Addressed bus channel abstraction
//!
//! A [`BusChannel`] is a single addressed I/O line as seen by a driver: a
//! PWM channel on an I2C expander, a GPIO line, a 1-Wire device file. The
//! driver never learns how the platform moves the bits.

/// Coarse classification of a bus fault
///
/// Drivers map this onto their own error taxonomy (a missing 1-Wire device
/// is reported differently from one that stopped answering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusErrorKind {
    /// The addressed device or line does not exist
    NotFound,
    /// The device did not respond within the platform's window
    Timeout,
    /// Any other transport failure
    Other,
}

/// Bus error that can describe itself
///
/// Mirrors the `kind()` convention of the embedded-hal error traits.
pub trait BusError: core::fmt::Debug {
    /// Classify this error
    fn kind(&self) -> BusErrorKind;
}

impl BusError for BusErrorKind {
    fn kind(&self) -> BusErrorKind {
        *self
    }
}

impl BusError for core::convert::Infallible {
    fn kind(&self) -> BusErrorKind {
        match *self {}
    }
}

/// Addressed read/write primitive over one bus
///
/// Implementations are supplied by the platform. Drivers own an address
/// (their device handle) and only ever touch that address.
pub trait BusChannel {
    /// Address of a line or device on this bus
    type Address: Copy;

    /// Error type for bus operations
    type Error: BusError;

    /// Write a value to the given address
    ///
    /// The meaning of `value` is bus specific: a 16-bit duty cycle for a
    /// PWM channel, 0/1 for a digital line.
    fn write(&mut self, address: Self::Address, value: u32) -> Result<(), Self::Error>;

    /// Read raw bytes from the given address
    ///
    /// Returns the number of bytes placed in `buf`.
    fn read(&mut self, address: Self::Address, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Release the given address back to the platform
    ///
    /// Called at most once per address by the owning driver.
    fn release(&mut self, address: Self::Address) -> Result<(), Self::Error>;
}

/// Borrowed buses are buses too, so several drivers can take turns on one
/// physical bus without the bus being duplicated.
impl<T: BusChannel + ?Sized> BusChannel for &mut T {
    type Address = T::Address;
    type Error = T::Error;

    fn write(&mut self, address: Self::Address, value: u32) -> Result<(), Self::Error> {
        T::write(self, address, value)
    }

    fn read(&mut self, address: Self::Address, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read(self, address, buf)
    }

    fn release(&mut self, address: Self::Address) -> Result<(), Self::Error> {
        T::release(self, address)
    }
}
