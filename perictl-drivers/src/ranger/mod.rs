//! Distance sensor drivers

pub mod hcsr04;

pub use hcsr04::{Hcsr04, RangerError};
