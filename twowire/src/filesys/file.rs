//! File operations

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::WireError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub fn exists(&self) -> bool {
        fs::metadata(&self.path).is_ok()
    }

    /// Read file contents as string
    pub fn read_string(&self) -> Result<String, WireError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Read file as JSON
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, WireError> {
        let contents = self.read_string()?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Write string to file
    pub fn write_string(&self, contents: &str) -> Result<(), WireError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Write JSON to file
    pub fn write_json<T: Serialize>(&self, value: &T) -> Result<(), WireError> {
        let contents = serde_json::to_string_pretty(value)?;
        self.write_string(&contents)
    }
}
