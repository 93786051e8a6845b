//! TwoWire transaction facade
//!
//! Arduino `Wire`-style API over any [`Backend`]:
//!
//! ```text
//! begin_transmission(addr) -> write_byte/write_bytes ... -> end_transmission()
//! request_from(addr, n) -> available() / read() ...
//! ```
//!
//! The facade owns both buffers. The transmission buffer collects bytes between
//! `begin_transmission` and `end_transmission`; nothing touches the bus until the
//! flush. The reception buffer is filled in bulk by `request_from` and drained
//! front to back by `read`.
//!
//! Errors never escape the Arduino-style methods: `begin` reports `false`,
//! `end_transmission` a negative status and `request_from` a zero count. The
//! `try_*` variants return the underlying [`WireError`] instead.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::errors::WireError;
use crate::platform::host_backend;
use crate::settings::Settings;

/// `end_transmission` status on success
pub const TRANSMISSION_OK: i32 = 0;

/// `end_transmission` status on any failure
pub const TRANSMISSION_FAILED: i32 = -1;

/// Returned by `read` when the reception buffer is empty
///
/// Indistinguishable from a genuine 0xFF byte; use [`TwoWire::try_read`] when
/// the difference matters.
pub const EMPTY_READ: u8 = 0xFF;

/// Largest `request_from` count, matching the 8-bit count of the Arduino API
pub const MAX_REQUEST_LEN: usize = u8::MAX as usize;

/// A buffered, transaction-oriented I2C session
///
/// Sessions are not synchronized. Use one per thread or guard it externally.
#[derive(Debug)]
pub struct TwoWire<B: Backend = Box<dyn Backend>> {
    backend: B,
    initialized: bool,
    target_address: u8,
    tx_buffer: Vec<u8>,
    rx_buffer: VecDeque<u8>,
}

impl TwoWire<Box<dyn Backend>> {
    /// Create a session on the backend matching the host OS
    ///
    /// Fails immediately with [`WireError::UnsupportedPlatform`] on anything but
    /// Linux and Windows. No I/O happens until [`TwoWire::begin`].
    pub fn for_host(settings: &Settings) -> Result<Self, WireError> {
        Ok(Self::new(host_backend(settings)?))
    }
}

impl<B: Backend> TwoWire<B> {
    /// Create an uninitialized session
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            initialized: false,
            target_address: 0,
            tx_buffer: Vec::new(),
            rx_buffer: VecDeque::new(),
        }
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether `begin` succeeded and `end` has not been called since
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Address recorded by the last `begin_transmission`
    pub fn target_address(&self) -> u8 {
        self.target_address
    }

    /// Bytes queued since the last `begin_transmission`
    pub fn pending(&self) -> &[u8] {
        &self.tx_buffer
    }

    fn reset_buffers(&mut self) {
        self.tx_buffer.clear();
        self.rx_buffer.clear();
    }

    /// Acquire the backend resource, reporting why it failed
    ///
    /// Safe to call repeatedly; an open handle is released before re-opening.
    pub fn try_begin(&mut self) -> Result<(), WireError> {
        self.initialized = false;
        self.reset_buffers();

        self.backend.open()?;
        self.initialized = true;
        info!(backend = self.backend.name(), "TwoWire session started");
        Ok(())
    }

    /// Acquire the backend resource
    ///
    /// Returns `false` and leaves the session uninitialized on any failure.
    pub fn begin(&mut self) -> bool {
        match self.try_begin() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to initialize I2C interface: {}", e);
                false
            }
        }
    }

    /// Release the backend resource and clear both buffers
    ///
    /// Idempotent.
    pub fn end(&mut self) {
        if self.initialized || self.backend.is_open() {
            self.backend.close();
            debug!(backend = self.backend.name(), "TwoWire session ended");
        }
        self.initialized = false;
        self.reset_buffers();
    }

    /// Start a transaction to `address`
    ///
    /// Discards anything queued by an unfinished previous transaction.
    pub fn begin_transmission(&mut self, address: u8) {
        if !self.tx_buffer.is_empty() {
            debug!(
                "Discarding {} unsent bytes for 0x{:02x}",
                self.tx_buffer.len(),
                self.target_address
            );
        }
        self.target_address = address;
        self.tx_buffer.clear();
    }

    /// Queue one byte
    pub fn write_byte(&mut self, byte: u8) {
        self.tx_buffer.push(byte);
    }

    /// Queue a sequence of bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx_buffer.extend_from_slice(bytes);
    }

    /// Flush the transaction, reporting why it failed
    ///
    /// `send_stop` is accepted for API compatibility; neither backend
    /// distinguishes a repeated start from a stop.
    pub fn try_end_transmission(&mut self, _send_stop: bool) -> Result<(), WireError> {
        if !self.initialized {
            return Err(WireError::NotInitialized);
        }
        self.backend.transmit(self.target_address, &self.tx_buffer)
    }

    /// Flush the transaction
    ///
    /// Returns [`TRANSMISSION_OK`] once every queued byte was delivered, otherwise
    /// [`TRANSMISSION_FAILED`] and no byte may be assumed delivered.
    pub fn end_transmission(&mut self, send_stop: bool) -> i32 {
        match self.try_end_transmission(send_stop) {
            Ok(()) => TRANSMISSION_OK,
            Err(e) => {
                warn!("I2C write to 0x{:02x} failed: {}", self.target_address, e);
                TRANSMISSION_FAILED
            }
        }
    }

    /// Read up to `num_bytes` from `address` into the reception buffer, reporting
    /// why it failed
    pub fn try_request_from(
        &mut self,
        address: u8,
        num_bytes: usize,
        _send_stop: bool,
    ) -> Result<usize, WireError> {
        if !self.initialized {
            return Err(WireError::NotInitialized);
        }
        if num_bytes > MAX_REQUEST_LEN {
            return Err(WireError::Reception(format!(
                "Requested {} bytes, at most {} per request",
                num_bytes, MAX_REQUEST_LEN
            )));
        }
        let data = self.backend.receive(address, num_bytes)?;
        self.rx_buffer.extend(data.iter().copied());
        Ok(data.len())
    }

    /// Read up to `num_bytes` from `address` into the reception buffer
    ///
    /// Returns the number of bytes received, 0 on failure. Counts above
    /// [`MAX_REQUEST_LEN`] fail without touching the bus.
    pub fn request_from(&mut self, address: u8, num_bytes: usize, send_stop: bool) -> usize {
        match self.try_request_from(address, num_bytes, send_stop) {
            Ok(received) => received,
            Err(e) => {
                warn!("I2C read from 0x{:02x} failed: {}", address, e);
                0
            }
        }
    }

    /// Pop the oldest received byte, or [`EMPTY_READ`] if none is buffered
    pub fn read(&mut self) -> u8 {
        self.try_read().unwrap_or(EMPTY_READ)
    }

    /// Pop the oldest received byte
    pub fn try_read(&mut self) -> Option<u8> {
        self.rx_buffer.pop_front()
    }

    /// Oldest received byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.rx_buffer.front().copied()
    }

    /// Number of received bytes not yet read
    pub fn available(&self) -> usize {
        self.rx_buffer.len()
    }
}

impl<B: Backend> Drop for TwoWire<B> {
    fn drop(&mut self) {
        self.end();
    }
}
