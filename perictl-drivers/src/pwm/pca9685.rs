//! PCA9685 16-channel PWM expander
//!
//! The chip has a 12-bit counter per period and a pair of ON/OFF compare
//! registers per channel. Drivers above this one speak 16-bit duty values
//! (`0..=0xFFFF`), which are scaled down here.
//!
//! # Register map (subset)
//!
//! | Register   | Address          | Use                              |
//! |------------|------------------|----------------------------------|
//! | MODE1      | 0x00             | Sleep, auto-increment, restart   |
//! | LEDn_ON_L  | 0x06 + 4n        | Start of the channel's 4 bytes   |
//! | PRESCALE   | 0xFE             | Period divider (sleep only)      |

use embedded_hal::delay::DelayNs;
use perictl_hal::{BusChannel, BusError, BusErrorKind, I2cBus};

/// Default 7-bit I2C address (all address pins low)
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Number of PWM channels
pub const CHANNELS: u8 = 16;

/// Internal oscillator frequency (Hz)
const OSC_HZ: u32 = 25_000_000;

/// Counter steps per period
const STEPS: u32 = 4096;

const MODE1: u8 = 0x00;
const LED0_ON_L: u8 = 0x06;
const PRESCALE: u8 = 0xFE;

const MODE1_RESTART: u8 = 0x80;
const MODE1_AI: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;

/// Bit 4 of LEDn_ON_H / LEDn_OFF_H: channel fully on / fully off
const FULL: u16 = 0x1000;

/// Oscillator settle time after leaving sleep (µs)
const WAKE_US: u32 = 500;

/// Errors from the PCA9685
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pca9685Error<E> {
    /// I2C transfer failed
    Bus(E),
    /// Channel number is not 0-15
    InvalidChannel(u8),
}

impl<E: BusError> BusError for Pca9685Error<E> {
    fn kind(&self) -> BusErrorKind {
        match self {
            Pca9685Error::Bus(e) => e.kind(),
            Pca9685Error::InvalidChannel(_) => BusErrorKind::NotFound,
        }
    }
}

/// Prescaler for a PWM frequency
///
/// `round(25 MHz / (4096 * hz)) - 1`, clamped to the chip's 3..=255.
pub fn prescale_for(frequency_hz: u32) -> u8 {
    if frequency_hz == 0 {
        return u8::MAX;
    }
    let divisor = STEPS as u64 * frequency_hz as u64;
    let rounded = (OSC_HZ as u64 + divisor / 2) / divisor;
    rounded.saturating_sub(1).clamp(3, 255) as u8
}

/// ON/OFF compare values for a 16-bit duty
fn compare_values(duty: u16) -> (u16, u16) {
    match duty {
        0xFFFF => (FULL, 0),
        0 => (0, FULL),
        _ => (0, duty >> 4),
    }
}

/// PCA9685 on an I2C bus
///
/// As a [`BusChannel`] the address is the PWM channel and the value a
/// 16-bit duty cycle. Values above `0xFFFF` saturate.
pub struct Pca9685<I> {
    i2c: I,
    address: u8,
}

impl<I: I2cBus> Pca9685<I> {
    /// Create a driver for the chip at `address`
    ///
    /// Does not touch the bus; call [`Self::init`] before writing channels.
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// 7-bit I2C address of the chip
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the I2C bus back
    pub fn into_inner(self) -> I {
        self.i2c
    }

    /// Reset MODE1 to auto-increment and set the PWM frequency
    pub fn init(
        &mut self,
        frequency_hz: u32,
        delay: &mut impl DelayNs,
    ) -> Result<(), Pca9685Error<I::Error>> {
        self.write_register(MODE1, MODE1_AI)?;
        self.set_frequency(frequency_hz, delay)
    }

    /// Set the PWM frequency for all channels
    ///
    /// The prescaler only latches while the oscillator is asleep, so the
    /// chip is put to sleep, reprogrammed, woken and restarted. Channel
    /// outputs resume where they were.
    pub fn set_frequency(
        &mut self,
        frequency_hz: u32,
        delay: &mut impl DelayNs,
    ) -> Result<(), Pca9685Error<I::Error>> {
        let prescale = prescale_for(frequency_hz);
        let old_mode = self.read_register(MODE1)?;

        self.write_register(MODE1, (old_mode & !MODE1_RESTART) | MODE1_SLEEP)?;
        self.write_register(PRESCALE, prescale)?;
        self.write_register(MODE1, old_mode & !MODE1_SLEEP)?;
        delay.delay_us(WAKE_US);
        self.write_register(MODE1, (old_mode & !MODE1_SLEEP) | MODE1_RESTART | MODE1_AI)
    }

    /// Current prescaler value
    pub fn prescale(&mut self) -> Result<u8, Pca9685Error<I::Error>> {
        self.read_register(PRESCALE)
    }

    /// Put the chip to sleep, stopping every output
    pub fn deinit(&mut self) -> Result<(), Pca9685Error<I::Error>> {
        let mode = self.read_register(MODE1)?;
        self.write_register(MODE1, (mode & !MODE1_RESTART) | MODE1_SLEEP)
    }

    /// Write a 16-bit duty to one channel
    pub fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), Pca9685Error<I::Error>> {
        let register = channel_register(channel)?;
        let (on, off) = compare_values(duty);
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();

        self.i2c
            .write(self.address, &[register, on_l, on_h, off_l, off_h])
            .map_err(Pca9685Error::Bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Pca9685Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(Pca9685Error::Bus)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Pca9685Error<I::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Pca9685Error::Bus)
    }
}

fn channel_register<E>(channel: u8) -> Result<u8, Pca9685Error<E>> {
    if channel >= CHANNELS {
        return Err(Pca9685Error::InvalidChannel(channel));
    }
    Ok(LED0_ON_L + 4 * channel)
}

impl<I: I2cBus> BusChannel for Pca9685<I> {
    type Address = u8;
    type Error = Pca9685Error<I::Error>;

    fn write(&mut self, channel: u8, value: u32) -> Result<(), Self::Error> {
        let duty = value.min(u16::MAX as u32) as u16;
        self.set_duty(channel, duty)
    }

    /// Reads the channel's raw ON_L, ON_H, OFF_L, OFF_H registers
    fn read(&mut self, channel: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let register = channel_register(channel)?;
        let len = buf.len().min(4);
        self.i2c
            .write_read(self.address, &[register], &mut buf[..len])
            .map_err(Pca9685Error::Bus)?;
        Ok(len)
    }

    /// Drives the channel fully off
    fn release(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.set_duty(channel, 0)
    }
}
