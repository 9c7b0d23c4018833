//! Peripheral driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in perictl-core for common hobby peripherals:
//!
//! - PWM expander (PCA9685)
//! - Servo positioning over any PWM bus (SG90 and friends)
//! - Temperature sensors (DS18B20) and a retrying read wrapper
//! - Relay outputs
//! - Ultrasonic ranging (HC-SR04)
//!
//! Drivers take their bus as a value (`&mut Bus` works too) and own the
//! addresses they drive; every one of them implements `Cleanup`.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod pwm;
pub mod ranger;
pub mod sensor;
pub mod servo;
pub mod switch;
