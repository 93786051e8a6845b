//! Error types for twowire

use thiserror::Error;

/// Main error type for TwoWire sessions and their backends
#[derive(Error, Debug)]
pub enum WireError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Device path missing, permission denied, driver not loadable
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Session not initialized, call begin() first")]
    NotInitialized,

    #[error("Transmission error: {0}")]
    Transmission(String),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("Reception error: {0}")]
    Reception(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sensor error: {0}")]
    SensorError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for WireError {
    fn from(err: anyhow::Error) -> Self {
        WireError::Internal(err.to_string())
    }
}
