//! Register-call backend
//!
//! The vendor driver only knows "write `n` bytes to register `r` of device `d`"
//! and "read `n` bytes starting at register `r` of device `d`". A flat TwoWire
//! transmission buffer is split back into register + payload here:
//!
//! - one byte: register pointer select, cached in `last_register_address`, no device call
//! - two or more bytes: `write_i2c(device, buffer[0], buffer[1..])`
//!
//! Reads always start at `last_register_address`. Nothing checks that the pointer
//! was selected for the current device; a caller that skips the select step reads
//! whatever register the previous transaction left behind.

use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::backend::ch341::Ch341Library;
use crate::backend::Backend;
use crate::errors::WireError;
use crate::settings::RegisterSettings;

/// Entry points of a USB-to-I2C bridge driver
pub trait RegisterDriver: Send {
    /// Driver version, informational only
    fn version(&self) -> u32;

    fn open_device(&mut self, index: u32) -> Result<(), WireError>;

    fn close_device(&mut self, index: u32);

    /// Switch the device into a streaming mode (1 = I2C)
    fn set_stream(&mut self, index: u32, mode: u32) -> Result<(), WireError>;

    /// Fill `buf` starting at `register` of `device`
    fn read_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), WireError>;

    /// Write `data` starting at `register` of `device`
    fn write_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), WireError>;
}

/// Loads a fresh [`RegisterDriver`] on every `open`
pub type DriverLoader = Box<dyn FnMut() -> Result<Box<dyn RegisterDriver>, WireError> + Send>;

/// Backend over a register-addressed vendor driver
pub struct RegisterAdapter {
    settings: RegisterSettings,
    loader: DriverLoader,
    driver: Option<Box<dyn RegisterDriver>>,
    last_register_address: u8,
}

impl RegisterAdapter {
    /// Create an adapter loading the CH341 driver named in `settings`
    pub fn new(settings: RegisterSettings) -> Self {
        let library_path = settings.library_path.clone();
        let loader: DriverLoader = Box::new(move || {
            let library = Ch341Library::load(&library_path)?;
            Ok(Box::new(library) as Box<dyn RegisterDriver>)
        });
        Self::with_loader(settings, loader)
    }

    /// Create an adapter with a custom driver loader
    pub fn with_loader(settings: RegisterSettings, loader: DriverLoader) -> Self {
        Self {
            settings,
            loader,
            driver: None,
            last_register_address: 0,
        }
    }

    /// Register the next `receive` starts at
    pub fn last_register_address(&self) -> u8 {
        self.last_register_address
    }

    /// Get device index
    pub fn device_index(&self) -> u32 {
        self.settings.device_index
    }
}

impl fmt::Debug for RegisterAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterAdapter")
            .field("settings", &self.settings)
            .field("is_open", &self.driver.is_some())
            .field("last_register_address", &self.last_register_address)
            .finish()
    }
}

impl Backend for RegisterAdapter {
    fn name(&self) -> &'static str {
        "register"
    }

    fn open(&mut self) -> Result<(), WireError> {
        self.close();

        let index = self.settings.device_index;
        let mut driver = (self.loader)()?;
        info!("CH341 driver version: 0x{:x}", driver.version());

        driver.open_device(index).map_err(|e| {
            WireError::ResourceUnavailable(format!("Failed to open CH341 device {}: {}", index, e))
        })?;

        if let Err(e) = driver.set_stream(index, self.settings.stream_mode) {
            driver.close_device(index);
            return Err(WireError::ResourceUnavailable(format!(
                "Failed to set I2C mode {} on device {}: {}",
                self.settings.stream_mode, index, e
            )));
        }

        self.driver = Some(driver);
        self.last_register_address = 0;
        info!("CH341 I2C interface initialized on device {}", index);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.close_device(self.settings.device_index);
            debug!("Closed CH341 device {}", self.settings.device_index);
        }
    }

    fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    fn transmit(&mut self, address: u8, payload: &[u8]) -> Result<(), WireError> {
        let index = self.settings.device_index;
        let driver = self.driver.as_mut().ok_or(WireError::NotInitialized)?;

        match payload {
            [] => Ok(()),
            [register] => {
                self.last_register_address = *register;
                trace!(address, register, "register pointer select");
                Ok(())
            }
            [register, data @ ..] => {
                trace!(address, register, ?data, "register write");
                driver
                    .write_i2c(index, address, *register, data)
                    .map_err(|e| {
                        warn!(
                            "CH341 write to 0x{:02x} register 0x{:02x} failed",
                            address, register
                        );
                        WireError::Transmission(e.to_string())
                    })
            }
        }
    }

    fn receive(&mut self, address: u8, len: usize) -> Result<Vec<u8>, WireError> {
        let index = self.settings.device_index;
        let register = self.last_register_address;
        let driver = self.driver.as_mut().ok_or(WireError::NotInitialized)?;

        let mut buf = vec![0u8; len];
        driver
            .read_i2c(index, address, register, &mut buf)
            .map_err(|e| WireError::Reception(e.to_string()))?;

        trace!(address, register, received = len, "register read");
        Ok(buf)
    }
}
