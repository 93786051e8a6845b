//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Parse an I2C address written as `0x6a`, `0X6A` or `106`
pub fn parse_address(s: &str) -> Result<u8, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    }
    .map_err(|e| format!("Invalid address {:?}: {}", s, e))?;

    if value > 0x7F {
        return Err(format!("Address 0x{:x} is not a 7-bit address", value));
    }
    Ok(value as u8)
}
