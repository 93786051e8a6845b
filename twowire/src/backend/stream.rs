//! Byte-stream backend
//!
//! Maps a transaction onto a character device: select the target address with a
//! control call, then write or read one contiguous byte stream. There is no
//! register concept here; the leading register byte of a write is ordinary payload.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::backend::Backend;
use crate::errors::WireError;

/// An opened i2c character device
pub trait CharDevice: Send {
    /// Select the 7-bit slave address for subsequent reads and writes
    fn set_slave_address(&mut self, address: u8) -> io::Result<()>;

    /// Write bytes, returning how many were accepted
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read into `buf`, returning how many bytes arrived
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens a [`CharDevice`] for a path
pub type DeviceOpener = Box<dyn Fn(&Path) -> io::Result<Box<dyn CharDevice>> + Send>;

/// Backend over a byte-stream character device
pub struct StreamAdapter {
    device_path: PathBuf,
    opener: DeviceOpener,
    device: Option<Box<dyn CharDevice>>,
}

impl StreamAdapter {
    /// Create an adapter for the host's i2c-dev device at `device_path`
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self::with_opener(device_path, Box::new(open_host_device))
    }

    /// Create an adapter with a custom device opener
    pub fn with_opener(device_path: impl Into<PathBuf>, opener: DeviceOpener) -> Self {
        Self {
            device_path: device_path.into(),
            opener,
            device: None,
        }
    }

    /// Get device path
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    fn device(&mut self) -> Result<&mut Box<dyn CharDevice>, WireError> {
        self.device.as_mut().ok_or(WireError::NotInitialized)
    }
}

impl fmt::Debug for StreamAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamAdapter")
            .field("device_path", &self.device_path)
            .field("is_open", &self.device.is_some())
            .finish()
    }
}

#[cfg(target_os = "linux")]
fn open_host_device(path: &Path) -> io::Result<Box<dyn CharDevice>> {
    let device = crate::backend::linux::LinuxCharDevice::open(path)?;
    Ok(Box::new(device))
}

#[cfg(not(target_os = "linux"))]
fn open_host_device(_path: &Path) -> io::Result<Box<dyn CharDevice>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "i2c-dev character devices are linux-only",
    ))
}

impl Backend for StreamAdapter {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn open(&mut self) -> Result<(), WireError> {
        if self.device.take().is_some() {
            debug!("Closing previously opened {}", self.device_path.display());
        }

        let device = (self.opener)(&self.device_path).map_err(|e| {
            WireError::ResourceUnavailable(format!(
                "Failed to open I2C device {}: {}",
                self.device_path.display(),
                e
            ))
        })?;
        self.device = Some(device);

        info!("I2C interface initialized: {}", self.device_path.display());
        Ok(())
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("Closed {}", self.device_path.display());
        }
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn transmit(&mut self, address: u8, payload: &[u8]) -> Result<(), WireError> {
        let device = self.device()?;

        device.set_slave_address(address).map_err(|e| {
            WireError::Transmission(format!("Failed to set I2C address 0x{:02x}: {}", address, e))
        })?;

        // Address select alone is a valid (empty) transaction
        if payload.is_empty() {
            return Ok(());
        }

        let written = device
            .write_bytes(payload)
            .map_err(|e| WireError::Transmission(format!("I2C write error: {}", e)))?;
        if written != payload.len() {
            return Err(WireError::ShortWrite {
                expected: payload.len(),
                written,
            });
        }

        trace!(address, ?payload, "stream write");
        Ok(())
    }

    fn receive(&mut self, address: u8, len: usize) -> Result<Vec<u8>, WireError> {
        let device = self.device()?;

        device.set_slave_address(address).map_err(|e| {
            WireError::Reception(format!("Failed to set I2C address 0x{:02x}: {}", address, e))
        })?;

        let mut buf = vec![0u8; len];
        let read = device
            .read_bytes(&mut buf)
            .map_err(|e| WireError::Reception(format!("I2C read error: {}", e)))?;
        buf.truncate(read);

        trace!(address, requested = len, received = read, "stream read");
        Ok(buf)
    }
}
