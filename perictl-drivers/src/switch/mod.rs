//! On/off output drivers

pub mod relay;

pub use relay::{RelayDriver, RelayError};
