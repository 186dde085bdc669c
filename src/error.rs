use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum PublisherError {
    #[error("Invalid device glob pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("No one-wire device matches {0}")]
    DeviceNotFound(String),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid temperature value {value:?}: {source}")]
    Parse {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("MQTT publish timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl PublisherError {
    /// True for failures on the sensor side (file I/O, bad value).
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, PublisherError>;
