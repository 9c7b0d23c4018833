//! DS18B20 1-Wire digital thermometer
//!
//! Two payload formats are understood, depending on what the platform bus
//! hands back for the device address:
//!
//! - [`Ds18b20Format::SysfsText`]: the Linux `w1_slave` file, where the
//!   kernel has already checked the CRC:
//!   ```text
//!   72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//!   72 01 4b 46 7f ff 0e 10 57 t=23125
//!   ```
//! - [`Ds18b20Format::Scratchpad`]: the 9 raw scratchpad bytes, as read by
//!   a bit-banged or bridge 1-Wire master. The CRC is checked here.

use perictl_core::traits::{Cleanup, Clock, SensorError, SensorReader};
use perictl_core::{DeviceHandle, Reading, Temperature};
use perictl_hal::{BusChannel, BusError};

/// Largest payload read from the bus (a `w1_slave` file is ~75 bytes)
const MAX_PAYLOAD: usize = 128;

/// Scratchpad length including the CRC byte
const SCRATCHPAD_LEN: usize = 9;

/// Value the sensor reports after power-on, before a conversion completes
pub const RESET_VALUE: Temperature = Temperature::from_millidegrees(85_000);

/// Lowest temperature the sensor can measure
pub const MIN_TEMP: Temperature = Temperature::from_degrees(-55);

/// Highest temperature the sensor can measure
pub const MAX_TEMP: Temperature = Temperature::from_degrees(125);

/// How the bus presents a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds18b20Format {
    /// Linux sysfs `w1_slave` text
    #[default]
    SysfsText,
    /// Raw 9-byte scratchpad
    Scratchpad,
}

/// Dallas/Maxim 1-Wire CRC-8 (polynomial x^8 + x^5 + x^4 + 1)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Parse a sysfs `w1_slave` payload
pub fn parse_w1_slave(payload: &[u8]) -> Result<Temperature, SensorError> {
    let text = core::str::from_utf8(payload).map_err(|_| SensorError::MalformedData)?;
    let mut lines = text.lines();

    let crc_line = lines.next().ok_or(SensorError::MalformedData)?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(SensorError::MalformedData);
    }

    let data_line = lines.next().ok_or(SensorError::MalformedData)?;
    let (_, value) = data_line
        .split_once("t=")
        .ok_or(SensorError::MalformedData)?;
    let millidegrees = value
        .trim()
        .parse::<i32>()
        .map_err(|_| SensorError::MalformedData)?;

    Ok(Temperature::from_millidegrees(millidegrees))
}

/// Parse a raw scratchpad
///
/// Undefined low bits are masked according to the configured resolution
/// (byte 4), so a 9-bit conversion reads as whole half-degrees.
pub fn parse_scratchpad(payload: &[u8]) -> Result<Temperature, SensorError> {
    if payload.len() < SCRATCHPAD_LEN {
        return Err(SensorError::MalformedData);
    }
    let scratchpad = &payload[..SCRATCHPAD_LEN];
    if crc8(&scratchpad[..8]) != scratchpad[8] {
        return Err(SensorError::MalformedData);
    }

    let mask: i16 = match (scratchpad[4] >> 5) & 0x03 {
        0 => !0x07,
        1 => !0x03,
        2 => !0x01,
        _ => !0x00,
    };
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]) & mask;

    Ok(Temperature::from_sixteenths(raw))
}

/// DS18B20 on a 1-Wire bus
///
/// Each [`read_once`](SensorReader::read_once) is exactly one bus read of
/// the device's payload. Readings are timestamped with `clock` after the
/// payload has been validated.
pub struct Ds18b20<B: BusChannel, C> {
    bus: B,
    handle: DeviceHandle<B::Address>,
    clock: C,
    format: Ds18b20Format,
    accept_reset_value: bool,
}

impl<B: BusChannel, C: Clock> Ds18b20<B, C> {
    /// Create a thermometer driver
    ///
    /// # Arguments
    /// - `bus`: 1-Wire bus
    /// - `device`: Address of the thermometer on that bus (owned by this driver)
    /// - `clock`: Timestamp source for readings
    /// - `format`: What the bus returns for the device
    pub fn new(bus: B, device: B::Address, clock: C, format: Ds18b20Format) -> Self {
        Self {
            bus,
            handle: DeviceHandle::new(device),
            clock,
            format,
            accept_reset_value: false,
        }
    }

    /// Accept 85.000°C as a real reading
    ///
    /// By default it is treated as malformed, since it is what the sensor
    /// reports when a conversion never ran (e.g. after a brown-out).
    pub fn accept_reset_value(mut self, accept: bool) -> Self {
        self.accept_reset_value = accept;
        self
    }

    /// Payload format in use
    pub fn format(&self) -> Ds18b20Format {
        self.format
    }

    /// Device address, or `None` once released
    pub fn device(&self) -> Option<B::Address> {
        self.handle.address()
    }

    fn check(&self, temperature: Temperature) -> Result<Temperature, SensorError> {
        if temperature == RESET_VALUE && !self.accept_reset_value {
            return Err(SensorError::MalformedData);
        }
        if temperature < MIN_TEMP || temperature > MAX_TEMP {
            return Err(SensorError::MalformedData);
        }
        Ok(temperature)
    }
}

impl<B: BusChannel, C: Clock> SensorReader for Ds18b20<B, C> {
    fn read_once(&mut self) -> Result<Reading, SensorError> {
        let device = self.handle.address().ok_or(SensorError::Released)?;

        let mut buf = [0u8; MAX_PAYLOAD];
        let len = self
            .bus
            .read(device, &mut buf)
            .map_err(|e| SensorError::from(e.kind()))?;
        let payload = &buf[..len.min(MAX_PAYLOAD)];

        let temperature = match self.format {
            Ds18b20Format::SysfsText => parse_w1_slave(payload)?,
            Ds18b20Format::Scratchpad => parse_scratchpad(payload)?,
        };
        let temperature = self.check(temperature)?;

        Ok(Reading::new(temperature, self.clock.now()))
    }
}

impl<B: BusChannel, C> Cleanup for Ds18b20<B, C> {
    type Error = B::Error;

    fn cleanup(&mut self) -> Result<(), B::Error> {
        match self.handle.take_for_release() {
            Some(device) => self.bus.release(device),
            None => Ok(()),
        }
    }

    fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use perictl_core::Timestamp;
    use perictl_hal::BusErrorKind;

    pub(crate) const W1_SLAVE: &[u8] =
        b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

    const SCRATCHPAD: [u8; 9] = [0x72, 0x01, 0x4b, 0x46, 0x7f, 0xff, 0x0e, 0x10, 0x57];

    /// Power-on scratchpad (85°C)
    const RESET_SCRATCHPAD: [u8; 9] = [0x50, 0x05, 0x4b, 0x46, 0x7f, 0xff, 0x0c, 0x10, 0x1c];

    pub(crate) struct FixedClock(pub u64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_micros(self.0)
        }
    }

    /// Bus returning a canned payload for address 0
    struct MockW1<'a> {
        payload: Result<&'a [u8], BusErrorKind>,
        reads: u32,
        releases: u32,
    }

    impl<'a> MockW1<'a> {
        fn new(payload: &'a [u8]) -> Self {
            Self {
                payload: Ok(payload),
                reads: 0,
                releases: 0,
            }
        }

        fn failing(kind: BusErrorKind) -> Self {
            Self {
                payload: Err(kind),
                reads: 0,
                releases: 0,
            }
        }
    }

    impl BusChannel for MockW1<'_> {
        type Address = u8;
        type Error = BusErrorKind;

        fn write(&mut self, _address: u8, _value: u32) -> Result<(), BusErrorKind> {
            Err(BusErrorKind::Other)
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, BusErrorKind> {
            self.reads += 1;
            if address != 0 {
                return Err(BusErrorKind::NotFound);
            }
            let payload = self.payload?;
            let len = payload.len().min(buf.len());
            buf[..len].copy_from_slice(&payload[..len]);
            Ok(len)
        }

        fn release(&mut self, _address: u8) -> Result<(), BusErrorKind> {
            self.releases += 1;
            Ok(())
        }
    }

    #[test]
    fn test_crc8() {
        assert_eq!(crc8(&SCRATCHPAD[..8]), 0x57);
        assert_eq!(crc8(&RESET_SCRATCHPAD[..8]), 0x1C);
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn test_parse_w1_slave() {
        assert_eq!(parse_w1_slave(W1_SLAVE).unwrap().millidegrees(), 23_125);

        let negative = b"5e ff 4b 46 7f ff 02 10 1f : crc=1f YES\n5e ff 4b 46 7f ff 02 10 1f t=-10125\n";
        assert_eq!(parse_w1_slave(negative).unwrap().millidegrees(), -10_125);
    }

    #[test]
    fn test_parse_w1_slave_rejects() {
        let bad_crc = b"72 01 4b 46 7f ff 0e 10 57 : crc=ff NO\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
        let no_value = b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57\n";
        let bad_digits = b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=2x3\n";
        let truncated = b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n";

        let payloads: [&[u8]; 6] = [bad_crc, no_value, bad_digits, truncated, b"", &[0xFF, 0xFE]];
        for payload in payloads {
            assert_eq!(parse_w1_slave(payload), Err(SensorError::MalformedData));
        }
    }

    #[test]
    fn test_parse_scratchpad() {
        assert_eq!(parse_scratchpad(&SCRATCHPAD).unwrap().millidegrees(), 23_125);
        assert_eq!(parse_scratchpad(&RESET_SCRATCHPAD).unwrap().millidegrees(), 85_000);

        let mut corrupt = SCRATCHPAD;
        corrupt[0] ^= 0x01;
        assert_eq!(parse_scratchpad(&corrupt), Err(SensorError::MalformedData));
        assert_eq!(parse_scratchpad(&SCRATCHPAD[..8]), Err(SensorError::MalformedData));
    }

    #[test]
    fn test_scratchpad_resolution_mask() {
        // 9-bit resolution: the three low bits are undefined
        let mut pad = [0x77, 0x01, 0x4b, 0x46, 0x1f, 0xff, 0x0e, 0x10, 0x00];
        pad[8] = crc8(&pad[..8]);
        // 0x177 & !7 = 0x170 = 23.0°C
        assert_eq!(parse_scratchpad(&pad).unwrap().millidegrees(), 23_000);
    }

    #[test]
    fn test_read_once() {
        let mut sensor = Ds18b20::new(
            MockW1::new(W1_SLAVE),
            0,
            FixedClock(1_000),
            Ds18b20Format::SysfsText,
        );
        let reading = sensor.read_once().unwrap();
        assert_eq!(reading.temperature().millidegrees(), 23_125);
        assert_eq!(reading.timestamp().as_micros(), 1_000);
        assert_eq!(sensor.bus.reads, 1);

        let mut sensor = Ds18b20::new(
            MockW1::new(&SCRATCHPAD),
            0,
            FixedClock(0),
            Ds18b20Format::Scratchpad,
        );
        assert_eq!(sensor.read_once().unwrap().temperature().millidegrees(), 23_125);
    }

    #[test]
    fn test_bus_errors_map_to_sensor_errors() {
        for (kind, expected) in [
            (BusErrorKind::NotFound, SensorError::DeviceNotFound),
            (BusErrorKind::Timeout, SensorError::IoTimeout),
            (BusErrorKind::Other, SensorError::BusFault),
        ] {
            let mut sensor = Ds18b20::new(
                MockW1::failing(kind),
                0,
                FixedClock(0),
                Ds18b20Format::SysfsText,
            );
            assert_eq!(sensor.read_once(), Err(expected));
            assert_eq!(sensor.bus.reads, 1);
        }
    }

    #[test]
    fn test_reset_value() {
        let mut sensor = Ds18b20::new(
            MockW1::new(&RESET_SCRATCHPAD),
            0,
            FixedClock(0),
            Ds18b20Format::Scratchpad,
        );
        assert_eq!(sensor.read_once(), Err(SensorError::MalformedData));

        let mut sensor = sensor.accept_reset_value(true);
        assert_eq!(sensor.read_once().unwrap().temperature(), RESET_VALUE);
    }

    #[test]
    fn test_implausible_value() {
        let hot = b"00 00 00 00 00 00 00 00 00 : crc=00 YES\n00 00 00 00 00 00 00 00 00 t=125063\n";
        let mut sensor = Ds18b20::new(MockW1::new(hot), 0, FixedClock(0), Ds18b20Format::SysfsText);
        assert_eq!(sensor.read_once(), Err(SensorError::MalformedData));

        let edge = b"00 00 00 00 00 00 00 00 00 : crc=00 YES\n00 00 00 00 00 00 00 00 00 t=-55000\n";
        let mut sensor = Ds18b20::new(MockW1::new(edge), 0, FixedClock(0), Ds18b20Format::SysfsText);
        assert_eq!(sensor.read_once().unwrap().temperature(), MIN_TEMP);
    }

    #[test]
    fn test_cleanup() {
        let mut sensor = Ds18b20::new(
            MockW1::new(W1_SLAVE),
            0,
            FixedClock(0),
            Ds18b20Format::SysfsText,
        );
        sensor.cleanup().unwrap();
        sensor.cleanup().unwrap();
        assert_eq!(sensor.bus.releases, 1);
        assert_eq!(sensor.device(), None);

        assert_eq!(sensor.read_once(), Err(SensorError::Released));
        assert_eq!(sensor.bus.reads, 0);
    }
}
