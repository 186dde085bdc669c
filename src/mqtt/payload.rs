//! Rendering of readings into MQTT message bodies.

use crate::error::Result;
use crate::sensor::Reading;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

/// How a reading is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PayloadFormat {
    /// Bare decimal string, e.g. `23.562`.
    #[default]
    Plain,
    /// `{"temperature":23.562,"timestamp":"..."}`
    Json,
}

#[derive(Debug, Serialize)]
struct JsonPayload {
    temperature: f64,
    timestamp: DateTime<Utc>,
}

impl PayloadFormat {
    pub fn render(&self, reading: &Reading) -> Result<String> {
        self.render_at(reading, Utc::now())
    }

    fn render_at(&self, reading: &Reading, timestamp: DateTime<Utc>) -> Result<String> {
        match self {
            Self::Plain => Ok(reading.to_string()),
            Self::Json => Ok(serde_json::to_string(&JsonPayload {
                temperature: reading.celsius(),
                timestamp,
            })?),
        }
    }
}
