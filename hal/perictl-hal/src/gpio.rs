//! GPIO pin adapter
//!
//! Exposes a single embedded-hal output pin as a [`BusChannel`] so that
//! digital-output drivers (relays) work on any MCU HAL as well as on the
//! Linux sysfs bus.

use embedded_hal::digital::StatefulOutputPin;

use crate::bus::{BusChannel, BusError, BusErrorKind};

/// Error from the wrapped embedded-hal pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinError<E>(pub E);

impl<E: embedded_hal::digital::Error> BusError for PinError<E> {
    fn kind(&self) -> BusErrorKind {
        // embedded-hal digital errors carry no finer classification
        BusErrorKind::Other
    }
}

/// One output pin viewed as a bus with a single (unit) address
///
/// `write` drives the pin high for any non-zero value. `read` reports the
/// driven level as one byte (0 or 1). Releasing is a no-op because an
/// embedded-hal pin has no "unexport"; the owning driver puts the line in
/// its safe level before releasing.
pub struct PinBus<P> {
    pin: P,
}

impl<P> PinBus<P> {
    /// Wrap an output pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Give the pin back
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> BusChannel for PinBus<P> {
    type Address = ();
    type Error = PinError<P::Error>;

    fn write(&mut self, _address: (), value: u32) -> Result<(), Self::Error> {
        if value != 0 {
            self.pin.set_high().map_err(PinError)
        } else {
            self.pin.set_low().map_err(PinError)
        }
    }

    fn read(&mut self, _address: (), buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(slot) = buf.first_mut() else {
            return Ok(0);
        };
        *slot = u8::from(self.pin.is_set_high().map_err(PinError)?);
        Ok(1)
    }

    fn release(&mut self, _address: ()) -> Result<(), Self::Error> {
        Ok(())
    }
}
