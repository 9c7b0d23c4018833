//! Linux platform bindings for perictl
//!
//! Implements the perictl bus traits on top of the kernel's userspace
//! interfaces, the way a Raspberry Pi exposes its peripherals:
//!
//! | Bus                    | Kernel interface            | Used by           |
//! |------------------------|-----------------------------|-------------------|
//! | [`w1::W1Bus`]          | `/sys/bus/w1/devices`       | DS18B20           |
//! | [`gpio::SysfsGpio`]    | `/sys/class/gpio`           | relay, HC-SR04    |
//! | [`i2c::LinuxPca9685`]  | `/dev/i2c-N` (i2c-dev)      | servo             |
//!
//! The `open_*` helpers build a ready-to-use driver from configuration.
//! Every driver they return implements `Cleanup`; wrap it in
//! [`Scoped`](perictl_core::Scoped) to release it on every exit path.

#![deny(unsafe_code)]

pub mod clock;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod w1;

use std::path::Path;

use perictl_core::config::{RangerConfig, RelayConfig, ThermometerConfig};
use perictl_drivers::ranger::Hcsr04;
use perictl_drivers::sensor::{Ds18b20, Ds18b20Format, RetryingSensor};
use perictl_drivers::switch::{RelayDriver, RelayError};

pub use clock::{MonotonicClock, SystemClock};
pub use error::{SysfsError, SysfsResult};
pub use gpio::SysfsGpio;
pub use i2c::{open_pca9685, LinuxPca9685, PwmSetupError};
/// Blocking delay for retry waits and trigger pulses
pub use linux_embedded_hal::Delay;
pub use w1::{W1Address, W1Bus};

/// DS18B20 read through sysfs, with retries
pub type LinuxThermometer = RetryingSensor<Ds18b20<W1Bus, SystemClock>>;

/// Relay on a sysfs GPIO line
pub type LinuxRelay = RelayDriver<SysfsGpio>;

/// HC-SR04 on sysfs GPIO lines
pub type LinuxRanger = Hcsr04<SysfsGpio, MonotonicClock>;

/// Open the configured thermometer under the standard sysfs root
pub fn open_thermometer(config: &ThermometerConfig) -> LinuxThermometer {
    open_thermometer_at(w1::DEFAULT_ROOT, config)
}

/// Open the configured thermometer under `root`
///
/// Without a configured device id the first thermometer present at read
/// time is used. Either way the device does not have to be present yet; a
/// late one is picked up by the retry loop.
pub fn open_thermometer_at(
    root: impl AsRef<Path>,
    config: &ThermometerConfig,
) -> LinuxThermometer {
    let mut bus = W1Bus::with_root(root.as_ref());
    let device = match &config.device_id {
        Some(id) => bus.device(id),
        None => W1Address::FIRST_THERMOMETER,
    };

    let sensor = Ds18b20::new(bus, device, SystemClock, Ds18b20Format::SysfsText)
        .accept_reset_value(config.accept_reset_value);
    RetryingSensor::new(sensor, config.retry)
}

/// Open the configured relay (switched off)
pub fn open_relay(config: &RelayConfig) -> Result<LinuxRelay, RelayError> {
    RelayDriver::from_config(SysfsGpio::new(), config)
}

/// Open the configured ultrasonic ranger
pub fn open_ranger(config: &RangerConfig) -> LinuxRanger {
    Hcsr04::from_config(SysfsGpio::new(), MonotonicClock::new(), config)
}
