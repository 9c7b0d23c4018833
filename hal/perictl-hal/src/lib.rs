//! Perictl Hardware Abstraction Layer
//!
//! This crate defines the narrow bus interface every perictl driver talks
//! to. Platforms (Linux sysfs, an MCU HAL, a test double) implement it and
//! hand an instance to the driver explicitly, so no driver reaches for a
//! global bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  perictl-drivers (servo, ds18b20, ...)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  perictl-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ perictl-hal-  │       │  embedded-hal │
//! │    linux      │       │   adapters    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::BusChannel`] - Addressed write/read/release primitive
//! - [`bus::BusError`] - Fault classification for bus errors
//! - [`i2c::I2cBus`] - I2C master operations (blanket impl for embedded-hal)
//!
//! # Adapters
//!
//! - [`gpio::PinBus`] - A single embedded-hal output pin as a bus channel

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use bus::{BusChannel, BusError, BusErrorKind};
pub use gpio::{PinBus, PinError};
pub use i2c::{I2cBus, I2cError};
