//! DS18B20-style one-wire temperature sensor.
//!
//! The kernel's `w1_therm` driver exposes each sensor as a directory under
//! `/sys/bus/w1/devices/28-*` holding a `w1_slave` file. Reading that file
//! triggers a conversion and returns two lines:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The first line ends with `YES` when the CRC check passed, the second holds
//! the temperature in millidegrees Celsius.

use crate::error::{PublisherError, Result};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

const VALID_MARKER: &str = "YES";
const VALUE_MARKER: &str = " t=";

/// A single temperature reading in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    celsius: f64,
}

impl Reading {
    pub fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    pub fn from_millidegrees(millidegrees: i64) -> Self {
        Self {
            celsius: millidegrees as f64 / 1000.0,
        }
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }
}

/// Shortest decimal form, keeping one fractional digit for whole degrees
/// (`23.562`, `5.0`, `-1.25`).
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.celsius.is_finite() && self.celsius.fract() == 0.0 {
            write!(f, "{:.1}", self.celsius)
        } else {
            write!(f, "{}", self.celsius)
        }
    }
}

/// Parse the contents of a `w1_slave` file.
///
/// Returns `Ok(None)` when no line carries the `YES` marker. A valid file
/// without a ` t=` value reads as 0°C. When several lines carry a value the
/// last one wins. A malformed value fails the parse even on invalid reads.
pub fn parse_w1_slave(content: &str) -> Result<Option<Reading>> {
    let mut valid = false;
    let mut reading = Reading::from_millidegrees(0);

    for line in content.lines() {
        if line.trim().ends_with(VALID_MARKER) {
            valid = true;
        }
        if let Some(pos) = line.find(VALUE_MARKER) {
            let value = line[pos + VALUE_MARKER.len()..].trim();
            let millidegrees = value
                .parse::<i64>()
                .map_err(|source| PublisherError::Parse {
                    value: value.to_string(),
                    source,
                })?;
            reading = Reading::from_millidegrees(millidegrees);
        }
    }

    if !valid {
        return Ok(None);
    }
    Ok(Some(reading))
}

/// A one-wire sensor addressed by the path of its `w1_slave` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct W1Device {
    path: PathBuf,
}

impl W1Device {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find the first device directory matching `pattern` and address the
    /// `file_name` inside it.
    pub fn discover(pattern: &str, file_name: &str) -> Result<Self> {
        let mut matches: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|m| m.ok()).collect();
        matches.sort();

        let folder = matches
            .into_iter()
            .next()
            .ok_or_else(|| PublisherError::DeviceNotFound(pattern.to_string()))?;

        let device = Self::new(folder.join(file_name));
        info!("[W1] Using device file {}", device.path.display());
        Ok(device)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the device file. The file is opened, fully consumed
    /// and closed on every call.
    pub async fn read(&self) -> Result<Option<Reading>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| PublisherError::Read {
                path: self.path.clone(),
                source,
            })?;

        let reading = parse_w1_slave(&content)?;
        debug!("[W1] {} -> {:?}", self.path.display(), reading);
        Ok(reading)
    }
}
