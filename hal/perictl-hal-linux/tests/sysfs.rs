//! End-to-end tests against a fake sysfs tree

use std::fs;
use std::path::Path;

use perictl_core::config::{RelayConfig, ThermometerConfig};
use perictl_core::traits::{Cleanup, SensorError, SwitchOutput};
use perictl_core::{RetryPolicy, Scoped};
use perictl_drivers::switch::RelayDriver;
use embedded_hal::delay::DelayNs;
use perictl_hal_linux::{open_thermometer_at, Delay, SysfsGpio};
use tempfile::TempDir;

const GOOD: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
const BAD_CRC: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=ff NO\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

fn add_thermometer(root: &Path, id: &str, contents: &str) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("w1_slave"), contents).unwrap();
}

fn quick_retries(device_id: Option<&str>) -> ThermometerConfig {
    ThermometerConfig {
        device_id: device_id.map(|id| id.try_into().unwrap()),
        retry: RetryPolicy::new(2, 0),
        ..ThermometerConfig::default()
    }
}

#[test]
fn reads_first_thermometer() {
    let sysfs = TempDir::new().unwrap();
    add_thermometer(sysfs.path(), "28-0000000000aa", GOOD);

    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(None));
    let reading = sensor.read_with_retry(&mut Delay).unwrap();

    assert_eq!(reading.temperature().millidegrees(), 23_125);
    assert_eq!(reading.temperature().to_string(), "23.13°C");
    assert!(reading.timestamp().as_secs() > 0);
}

#[test]
fn no_thermometer_present() {
    let sysfs = TempDir::new().unwrap();
    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(None));

    let exhausted = sensor.read_with_retry(&mut Delay).unwrap_err();
    assert_eq!(exhausted.attempts, 3);
    assert_eq!(exhausted.last_error, SensorError::DeviceNotFound);
}

/// Delay that plugs a thermometer in during the first wait
struct PlugInOnWait<'a> {
    root: &'a Path,
    waits: u32,
}

impl DelayNs for PlugInOnWait<'_> {
    fn delay_ns(&mut self, _ns: u32) {
        if self.waits == 0 {
            add_thermometer(self.root, "28-0000000000aa", GOOD);
        }
        self.waits += 1;
    }
}

#[test]
fn late_thermometer_found_by_retry() {
    let sysfs = TempDir::new().unwrap();
    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(None));
    let mut delay = PlugInOnWait {
        root: sysfs.path(),
        waits: 0,
    };

    let reading = sensor.read_with_retry(&mut delay).unwrap();
    assert_eq!(reading.temperature().millidegrees(), 23_125);
    assert_eq!(delay.waits, 1);
}

#[test]
fn missing_configured_device_exhausts_retries() {
    let sysfs = TempDir::new().unwrap();
    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(Some("28-unplugged")));

    let exhausted = sensor.read_with_retry(&mut Delay).unwrap_err();
    assert_eq!(exhausted.attempts, 3);
    assert_eq!(exhausted.last_error, SensorError::DeviceNotFound);
}

#[test]
fn bad_crc_is_malformed() {
    let sysfs = TempDir::new().unwrap();
    add_thermometer(sysfs.path(), "28-0000000000aa", BAD_CRC);

    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(None));
    let exhausted = sensor.read_with_retry(&mut Delay).unwrap_err();
    assert_eq!(exhausted.last_error, SensorError::MalformedData);
}

#[test]
fn sensor_recovers_when_device_appears() {
    let sysfs = TempDir::new().unwrap();
    let mut sensor = open_thermometer_at(sysfs.path(), &quick_retries(Some("28-0000000000aa")));
    assert!(sensor.read_with_retry(&mut Delay).is_err());

    add_thermometer(sysfs.path(), "28-0000000000aa", GOOD);
    assert!(sensor.read_with_retry(&mut Delay).is_ok());

    sensor.cleanup().unwrap();
    assert!(sensor.is_released());

    // Released: one attempt, no waiting out the retry budget
    let exhausted = sensor.read_with_retry(&mut Delay).unwrap_err();
    assert_eq!(exhausted.attempts, 1);
    assert_eq!(exhausted.last_error, SensorError::Released);
}

#[test]
fn scoped_relay_is_switched_off_and_unexported() {
    let sysfs = TempDir::new().unwrap();
    let line = sysfs.path().join("gpio17");
    fs::create_dir_all(&line).unwrap();
    fs::write(line.join("direction"), "in").unwrap();
    fs::write(line.join("value"), "0").unwrap();

    {
        let gpio = SysfsGpio::with_root(sysfs.path());
        let mut relay = Scoped::new(RelayDriver::from_config(gpio, &RelayConfig::default()).unwrap());
        relay.on().unwrap();
        assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "1");
    }

    assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "0");
    assert_eq!(
        fs::read_to_string(sysfs.path().join("unexport")).unwrap(),
        "17"
    );
}
