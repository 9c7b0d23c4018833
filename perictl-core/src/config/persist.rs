//! Binary configuration persistence
//!
//! Configuration is stored as postcard-serialized binary data, small enough
//! for an EEPROM page or a flash key-value slot.

use super::{ConfigError, PeripheralConfig};

/// Serialize a configuration into `buf`
///
/// Returns the used prefix of `buf`.
pub fn to_slice<'a>(config: &PeripheralConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
    postcard::to_slice(config, buf).map_err(|_| ConfigError::Serialize)
}

/// Deserialize and validate a configuration
pub fn from_bytes(bytes: &[u8]) -> Result<PeripheralConfig, ConfigError> {
    let config: PeripheralConfig =
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelayConfig, ServoConfig, ThermometerConfig};
    use crate::retry::RetryPolicy;

    #[test]
    fn test_persist_restores_config() {
        let mut device_id = heapless::String::new();
        device_id.push_str("28-00000a1b2c3d").unwrap();

        let config = PeripheralConfig {
            servo: Some(ServoConfig {
                channel: 3,
                ..ServoConfig::default()
            }),
            thermometer: Some(ThermometerConfig {
                device_id: Some(device_id),
                retry: RetryPolicy::new(5, 250),
                ..ThermometerConfig::default()
            }),
            relay: Some(RelayConfig::default()),
            ..PeripheralConfig::default()
        };

        let mut buf = [0u8; 128];
        let used = to_slice(&config, &mut buf).unwrap().len();
        let restored = from_bytes(&buf[..used]).unwrap();

        assert_eq!(restored, config);
    }

    #[test]
    fn test_buffer_too_small() {
        let config = PeripheralConfig {
            servo: Some(ServoConfig::default()),
            ..PeripheralConfig::default()
        };
        let mut buf = [0u8; 4];
        assert_eq!(to_slice(&config, &mut buf), Err(ConfigError::Serialize));
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        assert_eq!(from_bytes(&[]), Err(ConfigError::Deserialize));
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        let config = PeripheralConfig {
            servo: Some(ServoConfig {
                channel: 99,
                ..ServoConfig::default()
            }),
            ..PeripheralConfig::default()
        };
        let mut buf = [0u8; 64];
        let used = to_slice(&config, &mut buf).unwrap().len();
        assert_eq!(from_bytes(&buf[..used]), Err(ConfigError::InvalidChannel));
    }
}
