//! HC-SR04 ultrasonic range finder
//!
//! A 10 µs pulse on the trigger line starts a measurement; the sensor then
//! holds its echo line high for the round-trip time of the ultrasonic
//! burst. Both lines live on the same digital bus and are owned by the
//! driver.
//!
//! Timing is done by polling the echo line against a [`Clock`], so the
//! resolution is whatever one bus read plus one clock read costs.

use core::fmt;

use embedded_hal::delay::DelayNs;
use perictl_core::config::RangerConfig;
use perictl_core::traits::{Cleanup, Clock};
use perictl_core::DeviceHandle;
use perictl_hal::{BusChannel, BusError, BusErrorKind};

/// Speed of sound at ~20°C, centimetres per microsecond (343 m/s)
const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Shortest distance the sensor can resolve (cm)
pub const MIN_DISTANCE_CM: f32 = 2.0;

/// Longest distance the sensor can resolve (cm)
pub const MAX_DISTANCE_CM: f32 = 400.0;

/// Give up on an edge after this long (µs); 400 cm takes ~23.3 ms
const ECHO_TIMEOUT_US: u64 = 30_000;

/// Trigger pulse width (µs)
const TRIGGER_US: u32 = 10;

/// Errors from a range measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangerError {
    /// No echo edge arrived within the timeout
    NoEcho,
    /// Echo decoded to a distance the sensor cannot measure
    OutOfRange {
        /// Decoded distance (cm)
        centimetres: f32,
    },
    /// Trigger or echo line fault
    Bus(BusErrorKind),
    /// An average of zero samples was requested
    NoSamples,
    /// The ranger has been cleaned up
    Released,
}

impl fmt::Display for RangerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangerError::NoEcho => f.write_str("no echo"),
            RangerError::OutOfRange { centimetres } => {
                write!(f, "distance {:.1} cm outside sensor range", centimetres)
            }
            RangerError::Bus(kind) => write!(f, "ranger line fault ({:?})", kind),
            RangerError::NoSamples => f.write_str("at least one sample required"),
            RangerError::Released => f.write_str("ranger already released"),
        }
    }
}

fn bus_error<E: BusError>(e: E) -> RangerError {
    RangerError::Bus(e.kind())
}

/// Convert an echo high time to a one-way distance in centimetres
pub fn echo_to_cm(echo_us: u64) -> f32 {
    echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

/// HC-SR04 on a digital bus
pub struct Hcsr04<B: BusChannel, C> {
    bus: B,
    trigger: DeviceHandle<B::Address>,
    echo: DeviceHandle<B::Address>,
    clock: C,
}

impl<B: BusChannel, C: Clock> Hcsr04<B, C> {
    /// Create a ranger driver
    ///
    /// # Arguments
    /// - `bus`: Digital bus with both lines
    /// - `trigger`: Output line that starts a measurement
    /// - `echo`: Input line the sensor pulses
    /// - `clock`: Microsecond time source for echo timing
    pub fn new(bus: B, trigger: B::Address, echo: B::Address, clock: C) -> Self {
        Self {
            bus,
            trigger: DeviceHandle::new(trigger),
            echo: DeviceHandle::new(echo),
            clock,
        }
    }

    /// Measure one distance in centimetres
    pub fn measure_cm(&mut self, delay: &mut impl DelayNs) -> Result<f32, RangerError> {
        let trigger = self.trigger.address().ok_or(RangerError::Released)?;
        let echo = self.echo.address().ok_or(RangerError::Released)?;

        self.bus.write(trigger, 0).map_err(bus_error)?;
        delay.delay_us(2);
        self.bus.write(trigger, 1).map_err(bus_error)?;
        delay.delay_us(TRIGGER_US);
        self.bus.write(trigger, 0).map_err(bus_error)?;

        let start = self.clock.now();
        while !self.echo_high(echo)? {
            if self.clock.now().micros_since(start) > ECHO_TIMEOUT_US {
                return Err(RangerError::NoEcho);
            }
        }

        let rise = self.clock.now();
        while self.echo_high(echo)? {
            if self.clock.now().micros_since(rise) > ECHO_TIMEOUT_US {
                return Err(RangerError::NoEcho);
            }
        }
        let width_us = self.clock.now().micros_since(rise);

        let centimetres = echo_to_cm(width_us);
        if !(MIN_DISTANCE_CM..=MAX_DISTANCE_CM).contains(&centimetres) {
            return Err(RangerError::OutOfRange { centimetres });
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("ranger: echo {} us -> {} cm", width_us, centimetres);

        Ok(centimetres)
    }

    /// Mean of several measurements
    ///
    /// Waits `delay_ms` between samples, not after the last one. Any
    /// failed sample fails the whole average.
    pub fn average_cm(
        &mut self,
        samples: u8,
        delay_ms: u32,
        delay: &mut impl DelayNs,
    ) -> Result<f32, RangerError> {
        if samples == 0 {
            return Err(RangerError::NoSamples);
        }

        let mut total = 0.0f32;
        for i in 0..samples {
            total += self.measure_cm(delay)?;
            if i + 1 < samples {
                delay.delay_ms(delay_ms);
            }
        }
        Ok(total / samples as f32)
    }

    fn echo_high(&mut self, echo: B::Address) -> Result<bool, RangerError> {
        let mut level = [0u8; 1];
        match self.bus.read(echo, &mut level).map_err(bus_error)? {
            0 => Err(RangerError::Bus(BusErrorKind::Other)),
            _ => Ok(level[0] != 0),
        }
    }
}

impl<B: BusChannel<Address = u8>, C: Clock> Hcsr04<B, C> {
    /// Create a ranger driver from configuration
    pub fn from_config(bus: B, clock: C, config: &RangerConfig) -> Self {
        Self::new(bus, config.trigger_pin, config.echo_pin, clock)
    }

    /// Averaged measurement using the configured sample count and spacing
    pub fn measure_configured(
        &mut self,
        config: &RangerConfig,
        delay: &mut impl DelayNs,
    ) -> Result<f32, RangerError> {
        self.average_cm(config.samples, config.sample_delay_ms, delay)
    }
}

impl<B: BusChannel, C> Cleanup for Hcsr04<B, C> {
    type Error = RangerError;

    /// Drive the trigger low and release both lines
    ///
    /// Every step is attempted; the first error is reported.
    fn cleanup(&mut self) -> Result<(), RangerError> {
        let mut result = Ok(());
        if let Some(trigger) = self.trigger.take_for_release() {
            let low = self.bus.write(trigger, 0).map_err(bus_error);
            let released = self.bus.release(trigger).map_err(bus_error);
            result = low.and(released);
        }
        if let Some(echo) = self.echo.take_for_release() {
            result = result.and(self.bus.release(echo).map_err(bus_error));
        }
        result
    }

    fn is_released(&self) -> bool {
        self.trigger.is_released() && self.echo.is_released()
    }
}
