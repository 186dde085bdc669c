//! One-wire temperature publisher library.
//!
//! This library reads DS18B20-style sensors through the kernel's one-wire
//! sysfs files and publishes the readings to an MQTT broker.

pub mod config;
pub mod error;
pub mod mqtt;
pub mod publisher;
pub mod sensor;

use crate::config::SensorConfig;
use crate::error::Result;
use crate::sensor::W1Device;

/// Set up `env_logger` for the binaries: `info` unless `RUST_LOG` says
/// otherwise, millisecond timestamps. Repeated calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Resolve the sensor to read, either the configured file or the first
/// device matching the discovery pattern.
pub fn resolve_device(config: &SensorConfig) -> Result<W1Device> {
    match &config.device_file {
        Some(path) => Ok(W1Device::new(path)),
        None => W1Device::discover(&config.device_glob, &config.device_file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::PublisherError;
    use std::path::PathBuf;

    #[test]
    fn test_explicit_device_file_skips_discovery() {
        let mut config = Config::default().sensor;
        config.device_glob = "/nonexistent/28-*".to_string();
        config.device_file = Some(PathBuf::from("/tmp/w1_slave"));

        let device = resolve_device(&config).unwrap();
        assert_eq!(device.path(), PathBuf::from("/tmp/w1_slave"));
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger();
        init_logger();
        log::info!("logger initialised");
    }

    #[test]
    fn test_discovery_failure_is_reported() {
        let mut config = Config::default().sensor;
        config.device_glob = "/nonexistent/28-*".to_string();

        let err = resolve_device(&config).unwrap_err();
        assert!(matches!(err, PublisherError::DeviceNotFound(_)));
    }
}
