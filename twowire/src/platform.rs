//! Host platform selection

use std::fmt;

use tracing::debug;

use crate::backend::{Backend, RegisterAdapter, StreamAdapter};
use crate::errors::WireError;
use crate::settings::Settings;

/// Hosts with a TwoWire backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// i2c-dev character device
    Linux,
    /// CH341 vendor driver
    Windows,
}

impl Platform {
    /// Platform of the running host
    pub fn detect() -> Result<Self, WireError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier as reported by `std::env::consts::OS`
    pub fn from_os(os: &str) -> Result<Self, WireError> {
        match os {
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            other => Err(WireError::UnsupportedPlatform(format!(
                "{}. Only Windows and Linux are supported.",
                other
            ))),
        }
    }

    /// Build the backend for this platform
    pub fn backend(&self, settings: &Settings) -> Box<dyn Backend> {
        match self {
            Platform::Linux => Box::new(StreamAdapter::new(&settings.stream.device_path)),
            Platform::Windows => Box::new(RegisterAdapter::new(settings.register.clone())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// Backend for the running host
pub fn host_backend(settings: &Settings) -> Result<Box<dyn Backend>, WireError> {
    let platform = Platform::detect()?;
    let backend = platform.backend(settings);
    debug!(%platform, backend = backend.name(), "Selected TwoWire backend");
    Ok(backend)
}
