//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::WireError;
use crate::filesys::File;
use crate::logs::LogLevel;

/// Fixed path of the i2c-dev character device used on Linux
pub const DEFAULT_DEVICE_PATH: &str = "/dev/i2c-1";

/// Vendor driver shipped with the CH341 USB-to-I2C bridge on 64-bit Windows
pub const DEFAULT_LIBRARY_PATH: &str = "CH341DLLA64.dll";

/// `CH341SetStream` mode selecting I2C streaming
pub const I2C_STREAM_MODE: u32 = 1;

/// TwoWire settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Character-device backend (Linux)
    #[serde(default)]
    pub stream: StreamSettings,

    /// Vendor-driver backend (Windows)
    #[serde(default)]
    pub register: RegisterSettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WireError> {
        let file = File::new(path.as_ref());
        if !file.exists() {
            return Err(WireError::ConfigError(format!(
                "Settings file {} does not exist",
                file.path().display()
            )));
        }
        file.read_json()
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WireError> {
        File::new(path.as_ref()).write_json(self)
    }
}

/// Character-device backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// i2c-dev device path
    #[serde(default = "default_device_path")]
    pub device_path: String,
}

fn default_device_path() -> String {
    DEFAULT_DEVICE_PATH.to_string()
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            device_path: default_device_path(),
        }
    }
}

/// Vendor-driver backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSettings {
    /// Path or bare name of the vendor driver library
    #[serde(default = "default_library_path")]
    pub library_path: String,

    /// Device index passed to every driver call
    #[serde(default)]
    pub device_index: u32,

    /// Mode passed to `CH341SetStream`
    #[serde(default = "default_stream_mode")]
    pub stream_mode: u32,
}

fn default_library_path() -> String {
    DEFAULT_LIBRARY_PATH.to_string()
}

fn default_stream_mode() -> u32 {
    I2C_STREAM_MODE
}

impl Default for RegisterSettings {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            device_index: 0,
            stream_mode: default_stream_mode(),
        }
    }
}
