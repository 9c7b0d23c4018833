//! Relay output
//!
//! Drives a relay module (or SSR/MOSFET) from one digital line. The line
//! can be active-high (default) or active-low, as on most opto-isolated
//! relay boards.

use core::fmt;

use perictl_core::config::RelayConfig;
use perictl_core::traits::{Cleanup, SwitchOutput};
use perictl_core::DeviceHandle;
use perictl_hal::{BusChannel, BusError, BusErrorKind};

/// Errors from driving a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError {
    /// Writing or releasing the line failed
    Bus(BusErrorKind),
    /// The relay has been cleaned up
    Released,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Bus(kind) => write!(f, "relay line fault ({:?})", kind),
            RelayError::Released => f.write_str("relay already released"),
        }
    }
}

fn bus_error<E: BusError>(e: E) -> RelayError {
    RelayError::Bus(e.kind())
}

/// Relay on one digital line
pub struct RelayDriver<B: BusChannel> {
    bus: B,
    handle: DeviceHandle<B::Address>,
    /// If true, relay ON = line LOW
    active_low: bool,
    /// Current logical state (true = energized)
    on: bool,
}

impl<B: BusChannel> RelayDriver<B> {
    /// Create a relay driver and switch it off
    ///
    /// # Arguments
    /// - `bus`: Digital output bus
    /// - `line`: Line address on that bus (owned by this driver)
    /// - `active_low`: If true, the relay is energized when the line is LOW
    pub fn new(bus: B, line: B::Address, active_low: bool) -> Result<Self, RelayError> {
        let mut relay = Self {
            bus,
            handle: DeviceHandle::new(line),
            active_low,
            on: false,
        };
        // Never start energized, whatever the line was left at
        if let Err(e) = relay.set_on(false) {
            // The line may already be claimed; hand it back before failing
            if let Some(line) = relay.handle.take_for_release() {
                let _ = relay.bus.release(line);
            }
            return Err(e);
        }
        Ok(relay)
    }

    /// Create an active-high relay
    pub fn new_active_high(bus: B, line: B::Address) -> Result<Self, RelayError> {
        Self::new(bus, line, false)
    }

    /// Create an active-low relay
    pub fn new_active_low(bus: B, line: B::Address) -> Result<Self, RelayError> {
        Self::new(bus, line, true)
    }

    /// Line address, or `None` once released
    pub fn line(&self) -> Option<B::Address> {
        self.handle.address()
    }

    /// Check if the relay is wired active-low
    pub fn is_active_low(&self) -> bool {
        self.active_low
    }

    /// Line level for a logical state
    fn level(&self, on: bool) -> u32 {
        // Normal: on=true, active_low=false → high
        // Inverted: on=true, active_low=true → low
        u32::from(on != self.active_low)
    }
}

impl<B: BusChannel<Address = u8>> RelayDriver<B> {
    /// Create a relay driver from configuration
    pub fn from_config(bus: B, config: &RelayConfig) -> Result<Self, RelayError> {
        Self::new(bus, config.pin.pin, config.pin.inverted)
    }
}

impl<B: BusChannel> SwitchOutput for RelayDriver<B> {
    type Error = RelayError;

    fn set_on(&mut self, on: bool) -> Result<(), RelayError> {
        let line = self.handle.address().ok_or(RelayError::Released)?;
        self.bus.write(line, self.level(on)).map_err(bus_error)?;
        self.on = on;

        #[cfg(feature = "defmt")]
        defmt::debug!("relay {}", if on { "on" } else { "off" });

        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

impl<B: BusChannel> Cleanup for RelayDriver<B> {
    type Error = RelayError;

    /// Switch off, then release the line
    ///
    /// The release is attempted even if switching off failed; the first
    /// error is reported.
    fn cleanup(&mut self) -> Result<(), RelayError> {
        let Some(line) = self.handle.take_for_release() else {
            return Ok(());
        };
        let off = self.bus.write(line, self.level(false)).map_err(bus_error);
        if off.is_ok() {
            self.on = false;
        }
        let released = self.bus.release(line).map_err(bus_error);
        off.and(released)
    }

    fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}
