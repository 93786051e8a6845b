//! Bus backends
//!
//! A [`Backend`] turns one buffered TwoWire transaction into calls on a concrete
//! bus primitive. Two adapters exist:
//!
//! - [`StreamAdapter`]: raw byte stream over the Linux i2c-dev character device
//! - [`RegisterAdapter`]: address + register + length calls into the CH341 vendor driver
//!
//! Backends are single-owner and synchronous. Every call blocks until the driver
//! returns; timeouts are whatever the driver enforces.

pub mod ch341;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod mock;
pub mod register;
pub mod stream;

pub use register::{RegisterAdapter, RegisterDriver};
pub use stream::{CharDevice, StreamAdapter};

use crate::errors::WireError;

/// Device-level I/O behind a TwoWire session
pub trait Backend: Send {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Acquire the underlying resource
    ///
    /// Calling `open` on an open backend releases the prior handle first.
    fn open(&mut self) -> Result<(), WireError>;

    /// Release the underlying resource. No-op when already closed.
    fn close(&mut self);

    /// Whether the resource is currently held
    fn is_open(&self) -> bool;

    /// Deliver one transaction's bytes to the device at `address`
    ///
    /// By calling convention `payload[0]` is a register address; adapters that
    /// need the split reconstruct it, the others pass it through.
    fn transmit(&mut self, address: u8, payload: &[u8]) -> Result<(), WireError>;

    /// Read up to `len` bytes from the device at `address`
    ///
    /// The returned vector may be shorter than `len` if the device delivered less.
    fn receive(&mut self, address: u8, len: usize) -> Result<Vec<u8>, WireError>;
}

impl Backend for Box<dyn Backend> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn open(&mut self) -> Result<(), WireError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn transmit(&mut self, address: u8, payload: &[u8]) -> Result<(), WireError> {
        (**self).transmit(address, payload)
    }

    fn receive(&mut self, address: u8, len: usize) -> Result<Vec<u8>, WireError> {
        (**self).receive(address, len)
    }
}
