//! Hobby servo driver
//!
//! Positions a servo by writing one PWM duty value per move. The duty is
//! computed by a [`PulseConverter`]; the channel comes from a
//! [`DeviceHandle`] so it is released exactly once.
//!
//! ```ignore
//! let mut pca = Pca9685::new(i2c, 0x40);
//! pca.init(50, &mut delay)?;
//!
//! let servo = ServoDriver::new(&mut pca, 0, PulseConverter::SG90);
//! let mut servo = Scoped::new(servo);
//! servo.set_angle(Angle::from_degrees(45.0))?;
//! // channel is driven off when `servo` goes out of scope
//! ```

use perictl_core::config::{ConfigError, ServoConfig};
use perictl_core::traits::{ActuatorDriver, ActuatorError, Cleanup};
use perictl_core::{Angle, DeviceHandle, DutyValue, PulseConverter};
use perictl_hal::{BusChannel, BusError};

/// Servo on one PWM channel
pub struct ServoDriver<B: BusChannel> {
    bus: B,
    handle: DeviceHandle<B::Address>,
    converter: PulseConverter,
    last_duty: Option<DutyValue>,
}

impl<B: BusChannel> ServoDriver<B> {
    /// Create a servo driver
    ///
    /// # Arguments
    /// - `bus`: PWM bus the servo is wired to
    /// - `channel`: Channel address on that bus (owned by this driver)
    /// - `converter`: Angle to duty mapping for the servo model
    pub fn new(bus: B, channel: B::Address, converter: PulseConverter) -> Self {
        Self {
            bus,
            handle: DeviceHandle::new(channel),
            converter,
            last_duty: None,
        }
    }

    /// Angle to duty mapping in use
    pub fn converter(&self) -> &PulseConverter {
        &self.converter
    }

    /// Channel address, or `None` once released
    pub fn channel(&self) -> Option<B::Address> {
        self.handle.address()
    }

    /// Stop driving the servo so it no longer holds position
    ///
    /// Writes duty 0. The channel stays owned and `set_angle` works again
    /// afterwards.
    pub fn relax(&mut self) -> Result<(), ActuatorError> {
        self.write_duty(DutyValue::OFF)
    }

    fn write_duty(&mut self, duty: DutyValue) -> Result<(), ActuatorError> {
        let channel = self.handle.address().ok_or(ActuatorError::Released)?;
        self.bus
            .write(channel, duty.value())
            .map_err(|e| ActuatorError::BusWriteFailed(e.kind()))?;
        self.last_duty = Some(duty);
        Ok(())
    }
}

impl<B: BusChannel<Address = u8>> ServoDriver<B> {
    /// Create a servo driver from configuration
    pub fn from_config(bus: B, config: &ServoConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(bus, config.channel, config.converter()?))
    }
}

impl<B: BusChannel> ActuatorDriver for ServoDriver<B> {
    fn set_angle(&mut self, angle: Angle) -> Result<DutyValue, ActuatorError> {
        if self.handle.is_released() {
            return Err(ActuatorError::Released);
        }
        let duty = self.converter.angle_to_duty(angle)?;
        self.write_duty(duty)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("servo: {} deg -> duty {}", angle.degrees(), duty.value());

        Ok(duty)
    }

    fn last_duty(&self) -> Option<DutyValue> {
        self.last_duty
    }
}

impl<B: BusChannel> Cleanup for ServoDriver<B> {
    type Error = B::Error;

    fn cleanup(&mut self) -> Result<(), B::Error> {
        match self.handle.take_for_release() {
            Some(channel) => self.bus.release(channel),
            None => Ok(()),
        }
    }

    fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pwm::pca9685::tests::MockI2c;
    use crate::pwm::Pca9685;
    use perictl_core::pulse::OutOfRange;
    use perictl_core::Scoped;
    use perictl_hal::BusErrorKind;
    use std::vec::Vec;

    /// Bus that records every operation
    #[derive(Default)]
    struct MockBus {
        writes: Vec<(u8, u32)>,
        releases: Vec<u8>,
        fail_writes: bool,
    }

    impl BusChannel for MockBus {
        type Address = u8;
        type Error = BusErrorKind;

        fn write(&mut self, address: u8, value: u32) -> Result<(), BusErrorKind> {
            if self.fail_writes {
                return Err(BusErrorKind::Timeout);
            }
            self.writes.push((address, value));
            Ok(())
        }

        fn read(&mut self, _address: u8, _buf: &mut [u8]) -> Result<usize, BusErrorKind> {
            Ok(0)
        }

        fn release(&mut self, address: u8) -> Result<(), BusErrorKind> {
            self.releases.push(address);
            Ok(())
        }
    }

    #[test]
    fn test_set_angle_writes_duty() {
        let mut bus = MockBus::default();
        let mut servo = ServoDriver::new(&mut bus, 0, PulseConverter::SG90);

        assert_eq!(servo.set_angle(Angle::from_degrees(0.0)), Ok(DutyValue(3276)));
        assert_eq!(servo.set_angle(Angle::from_degrees(90.0)), Ok(DutyValue(6553)));
        assert_eq!(servo.last_duty(), Some(DutyValue(6553)));
        drop(servo);

        assert_eq!(bus.writes, [(0, 3276), (0, 6553)]);
    }

    #[test]
    fn test_out_of_range_never_writes() {
        let mut bus = MockBus::default();
        let mut servo = ServoDriver::new(&mut bus, 2, PulseConverter::SG90);

        for degrees in [-0.5, 90.5, 180.0, f32::NAN] {
            let err = servo.set_angle(Angle::from_degrees(degrees)).unwrap_err();
            assert!(matches!(err, ActuatorError::OutOfRange(OutOfRange { .. })));
            assert!(!err.is_transient());
        }
        assert_eq!(servo.last_duty(), None);
        drop(servo);

        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_bus_failure_reported() {
        let mut bus = MockBus {
            fail_writes: true,
            ..MockBus::default()
        };
        let mut servo = ServoDriver::new(&mut bus, 0, PulseConverter::SG90);

        let err = servo.set_angle(Angle::from_degrees(45.0)).unwrap_err();
        assert_eq!(err, ActuatorError::BusWriteFailed(BusErrorKind::Timeout));
        assert!(err.is_transient());
        assert_eq!(servo.last_duty(), None);
    }

    #[test]
    fn test_relax() {
        let mut bus = MockBus::default();
        let mut servo = ServoDriver::new(&mut bus, 1, PulseConverter::SG90);
        servo.set_angle(Angle::from_degrees(30.0)).unwrap();
        servo.relax().unwrap();
        assert_eq!(servo.last_duty(), Some(DutyValue::OFF));
        drop(servo);

        assert_eq!(bus.writes.last(), Some(&(1, 0)));
        assert!(bus.releases.is_empty());
    }

    #[test]
    fn test_cleanup_releases_once() {
        let mut bus = MockBus::default();
        let mut servo = ServoDriver::new(&mut bus, 5, PulseConverter::SG90);

        servo.cleanup().unwrap();
        servo.cleanup().unwrap();
        assert!(servo.is_released());
        assert_eq!(servo.channel(), None);

        assert_eq!(
            servo.set_angle(Angle::from_degrees(10.0)),
            Err(ActuatorError::Released)
        );
        assert_eq!(servo.relax(), Err(ActuatorError::Released));
        drop(servo);

        assert_eq!(bus.releases, [5]);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_scoped_servo_releases_on_early_return() {
        fn sweep(bus: &mut MockBus) -> Result<(), ActuatorError> {
            let mut servo = Scoped::new(ServoDriver::new(bus, 0, PulseConverter::SG90));
            servo.set_angle(Angle::from_degrees(45.0))?;
            servo.set_angle(Angle::from_degrees(120.0))?;
            Ok(())
        }

        let mut bus = MockBus::default();
        assert!(sweep(&mut bus).is_err());
        assert_eq!(bus.writes.len(), 1);
        assert_eq!(bus.releases, [0]);
    }

    #[test]
    fn test_from_config() {
        let config = ServoConfig {
            channel: 16,
            ..ServoConfig::default()
        };
        assert!(matches!(
            ServoDriver::from_config(MockBus::default(), &config),
            Err(ConfigError::InvalidChannel)
        ));

        let servo = ServoDriver::from_config(MockBus::default(), &ServoConfig::default()).unwrap();
        assert_eq!(servo.converter(), &PulseConverter::SG90);
        assert_eq!(servo.channel(), Some(0));
    }

    #[test]
    fn test_servo_on_pca9685() {
        let mut pca = Pca9685::new(MockI2c::new(), 0x40);
        {
            let mut servo = Scoped::new(ServoDriver::new(&mut pca, 4, PulseConverter::SG90));
            servo.set_angle(Angle::from_degrees(90.0)).unwrap();
        }
        // Last write was the release: channel 4 fully off
        let i2c = pca.into_inner();
        assert_eq!(i2c.channel(4), [0, 0, 0, 0x10]);

        let mut pca = Pca9685::new(MockI2c::new(), 0x40);
        let mut servo = ServoDriver::new(&mut pca, 16, PulseConverter::SG90);
        assert_eq!(
            servo.set_angle(Angle::from_degrees(0.0)),
            Err(ActuatorError::BusWriteFailed(BusErrorKind::NotFound))
        );
    }
}
