//! TOML configuration documents
//!
//! Every section and key is optional; missing values take their defaults.
//!
//! ```toml
//! [servo]
//! channel = 0
//! max_angle = 90.0
//!
//! [thermometer]
//! device_id = "28-00000a1b2c3d"
//! retry = { max_retries = 3, retry_interval_ms = 1000 }
//!
//! [relay]
//! pin = { pin = 17, inverted = false }
//! ```

use super::{ConfigError, PeripheralConfig};

/// Parse and validate a TOML configuration document
pub fn from_toml_str(input: &str) -> Result<PeripheralConfig, ConfigError> {
    let config: PeripheralConfig = ::toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
    config.validate()?;
    Ok(config)
}
