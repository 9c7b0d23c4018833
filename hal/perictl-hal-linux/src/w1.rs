//! 1-Wire bus through the kernel's w1 sysfs interface
//!
//! With `dtoverlay=w1-gpio` the kernel enumerates every slave under
//! `/sys/bus/w1/devices/<family>-<serial>/`. For thermometers the
//! `w1_slave` file triggers a conversion on read and returns the
//! [`SysfsText`](perictl_drivers::sensor::Ds18b20Format::SysfsText)
//! payload, so one file read is one sensor read.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use perictl_hal::BusChannel;

use crate::error::{SysfsError, SysfsResult};

/// Where the kernel lists 1-Wire slaves
pub const DEFAULT_ROOT: &str = "/sys/bus/w1/devices";

/// Device id prefix of DS18B20 thermometers (family code 0x28)
pub const THERMOMETER_PREFIX: &str = "28-";

/// Per-device data file
const SLAVE_FILE: &str = "w1_slave";

/// Handle to a device on a [`W1Bus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct W1Address(Slot);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    /// Index into the registered ids
    Registered(usize),
    /// Whichever thermometer is found first, resolved on read
    FirstThermometer,
}

impl W1Address {
    /// The first thermometer present when a read happens
    ///
    /// Until a thermometer shows up every read rescans the bus and fails
    /// with `NotFound`; after that the bus sticks to the device it found.
    pub const FIRST_THERMOMETER: W1Address = W1Address(Slot::FirstThermometer);
}

/// 1-Wire bus rooted at a sysfs directory
///
/// Device ids are registered once and then addressed by a small `Copy`
/// handle, so drivers can own an address without owning a string.
pub struct W1Bus {
    root: PathBuf,
    devices: Vec<String>,
    /// Registered index of the resolved first thermometer
    first: Option<usize>,
}

impl W1Bus {
    /// Bus at the standard sysfs location
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Bus rooted somewhere else (tests, chroots)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            devices: Vec::new(),
            first: None,
        }
    }

    /// Sysfs directory this bus reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids of all thermometers currently present, sorted
    pub fn scan_thermometers(&self) -> SysfsResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| SysfsError::from_io(&self.root, e))?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(THERMOMETER_PREFIX))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Register a device by id
    ///
    /// The device does not have to be present yet; a missing device shows
    /// up as `NotFound` on read. Registering the same id twice returns the
    /// same address.
    pub fn device(&mut self, id: &str) -> W1Address {
        W1Address(Slot::Registered(self.register(id)))
    }

    fn register(&mut self, id: &str) -> usize {
        if let Some(index) = self.devices.iter().position(|d| d == id) {
            return index;
        }
        self.devices.push(id.to_owned());
        self.devices.len() - 1
    }

    /// Register the first thermometer found (lowest id)
    ///
    /// Fails right away if none is present; use
    /// [`W1Address::FIRST_THERMOMETER`] to wait for one instead.
    pub fn first_thermometer(&mut self) -> SysfsResult<W1Address> {
        let index = self.resolve_first()?;
        Ok(W1Address(Slot::Registered(index)))
    }

    fn resolve_first(&mut self) -> SysfsResult<usize> {
        if let Some(index) = self.first {
            return Ok(index);
        }

        let ids = self.scan_thermometers()?;
        let id = ids
            .first()
            .ok_or_else(|| SysfsError::NotFound(self.root.join(format!("{}*", THERMOMETER_PREFIX))))?;

        #[cfg(feature = "defmt")]
        defmt::info!("w1: using first thermometer {=str}", id.as_str());

        let index = self.register(id);
        self.first = Some(index);
        Ok(index)
    }

    /// Id of a device, if known
    ///
    /// [`W1Address::FIRST_THERMOMETER`] has an id once a read found one.
    pub fn device_id(&self, address: W1Address) -> Option<&str> {
        let index = match address.0 {
            Slot::Registered(index) => index,
            Slot::FirstThermometer => self.first?,
        };
        self.devices.get(index).map(String::as_str)
    }

    fn slave_path(&mut self, address: W1Address) -> SysfsResult<PathBuf> {
        let index = match address.0 {
            Slot::Registered(index) => index,
            Slot::FirstThermometer => self.resolve_first()?,
        };
        let id = self
            .devices
            .get(index)
            .ok_or(SysfsError::UnknownAddress(index))?;
        Ok(self.root.join(id).join(SLAVE_FILE))
    }
}

impl Default for W1Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusChannel for W1Bus {
    type Address = W1Address;
    type Error = SysfsError;

    fn write(&mut self, _address: W1Address, _value: u32) -> SysfsResult<()> {
        Err(SysfsError::Unsupported("write"))
    }

    /// Reads the device's `w1_slave` file, truncated to `buf`
    fn read(&mut self, address: W1Address, buf: &mut [u8]) -> SysfsResult<usize> {
        let path = self.slave_path(address)?;
        let mut file = File::open(&path).map_err(|e| SysfsError::from_io(&path, e))?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| SysfsError::from_io(&path, e))?;

        let len = contents.len().min(buf.len());
        buf[..len].copy_from_slice(&contents[..len]);
        Ok(len)
    }

    /// Nothing to give back to the kernel; the registration stays valid
    fn release(&mut self, address: W1Address) -> SysfsResult<()> {
        match address.0 {
            Slot::Registered(index) if index >= self.devices.len() => {
                Err(SysfsError::UnknownAddress(index))
            }
            _ => Ok(()),
        }
    }
}
