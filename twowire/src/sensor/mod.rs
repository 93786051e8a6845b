//! Register access helpers for sensors on a TwoWire session
//!
//! Every read uses the pointer-select idiom: a one-byte transmission naming the
//! register, then `request_from`. This is the only sequence the register-call
//! backend understands, and the stream backend passes it through unchanged.

pub mod ism330dhcx;

use tracing::debug;

use crate::backend::Backend;
use crate::errors::WireError;
use crate::wire::TwoWire;

/// Write one register
pub fn write_register<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    register: u8,
    value: u8,
) -> Result<(), WireError> {
    wire.begin_transmission(address);
    wire.write_bytes(&[register, value]);
    wire.try_end_transmission(true)
}

/// Read `len` consecutive bytes starting at `register`
///
/// Bytes left unread in the reception buffer by earlier calls are discarded
/// first. A short read is an error.
pub fn read_registers<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    register: u8,
    len: usize,
) -> Result<Vec<u8>, WireError> {
    let stale = wire.available();
    if stale > 0 {
        debug!("Dropping {} stale received bytes", stale);
        while wire.try_read().is_some() {}
    }

    wire.begin_transmission(address);
    wire.write_byte(register);
    wire.try_end_transmission(false)?;

    let received = wire.try_request_from(address, len, true)?;
    let data: Vec<u8> = std::iter::from_fn(|| wire.try_read()).take(received).collect();
    if data.len() != len {
        return Err(WireError::Reception(format!(
            "Read {} of {} bytes from 0x{:02x} register 0x{:02x}",
            data.len(),
            len,
            address,
            register
        )));
    }
    Ok(data)
}

/// Read one register
pub fn read_register<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    register: u8,
) -> Result<u8, WireError> {
    let data = read_registers(wire, address, register, 1)?;
    Ok(data[0])
}
