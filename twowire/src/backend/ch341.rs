//! CH341 vendor driver (`CH341DLL.DLL` / `CH341DLLA64.dll`)
//!
//! Only the I2C subset of the DLL is bound. `CH341OpenDevice` and
//! `CH341CloseDevice` are mandatory; the other symbols are resolved lazily so an
//! older DLL still loads and fails the specific call instead.

use libloading::Library;
use tracing::debug;

use crate::backend::register::RegisterDriver;
use crate::errors::WireError;

/// `INVALID_HANDLE_VALUE` returned by `CH341OpenDevice` on failure
const INVALID_HANDLE_VALUE: isize = -1;

type OpenDeviceFn = unsafe extern "system" fn(index: u32) -> isize;
type CloseDeviceFn = unsafe extern "system" fn(index: u32);
type GetVersionFn = unsafe extern "system" fn() -> u32;
type SetStreamFn = unsafe extern "system" fn(index: u32, mode: u32) -> i32;
// Buffer + length exports, not the single-byte CH341ReadI2C/CH341WriteI2C of CH341DLL.H
type ReadI2cFn =
    unsafe extern "system" fn(index: u32, device: u8, addr: u8, buf: *mut u8, len: u32) -> i32;
type WriteI2cFn =
    unsafe extern "system" fn(index: u32, device: u8, addr: u8, buf: *mut u8, len: u32) -> i32;

/// A loaded CH341 driver library
pub struct Ch341Library {
    open_device: OpenDeviceFn,
    close_device: CloseDeviceFn,
    get_version: Option<GetVersionFn>,
    set_stream: Option<SetStreamFn>,
    read_i2c: Option<ReadI2cFn>,
    write_i2c: Option<WriteI2cFn>,
    // Declared last: the function pointers above must not outlive it
    _library: Library,
}

/// Copy a function pointer out of the library
///
/// # Safety
///
/// `T` must match the exported symbol's real signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Option<T> {
    library.get::<T>(name).ok().map(|s| *s)
}

impl Ch341Library {
    /// Load the driver library by path or bare name
    pub fn load(path: &str) -> Result<Self, WireError> {
        // SAFETY: loading runs DllMain of a vendor library chosen by the operator
        let library = unsafe { Library::new(path) }.map_err(|e| {
            WireError::ResourceUnavailable(format!("Failed to load {}: {}", path, e))
        })?;

        // SAFETY: open/close/version/stream follow CH341DLL.H; the I2C pair matches the
        // buffer + length aliases above
        let (open_device, close_device, get_version, set_stream, read_i2c, write_i2c) = unsafe {
            (
                symbol::<OpenDeviceFn>(&library, b"CH341OpenDevice\0"),
                symbol::<CloseDeviceFn>(&library, b"CH341CloseDevice\0"),
                symbol::<GetVersionFn>(&library, b"CH341GetVersion\0"),
                symbol::<SetStreamFn>(&library, b"CH341SetStream\0"),
                symbol::<ReadI2cFn>(&library, b"CH341ReadI2C\0"),
                symbol::<WriteI2cFn>(&library, b"CH341WriteI2C\0"),
            )
        };

        let (Some(open_device), Some(close_device)) = (open_device, close_device) else {
            return Err(WireError::ResourceUnavailable(format!(
                "{} does not export CH341OpenDevice/CH341CloseDevice",
                path
            )));
        };

        debug!(
            get_version = get_version.is_some(),
            set_stream = set_stream.is_some(),
            read_i2c = read_i2c.is_some(),
            write_i2c = write_i2c.is_some(),
            "Loaded {}",
            path
        );

        Ok(Self {
            open_device,
            close_device,
            get_version,
            set_stream,
            read_i2c,
            write_i2c,
            _library: library,
        })
    }
}

fn missing(name: &str) -> WireError {
    WireError::Driver(format!("{} is not exported by the loaded driver", name))
}

fn check(ok: i32, call: &str) -> Result<(), WireError> {
    if ok != 0 {
        Ok(())
    } else {
        Err(WireError::Driver(format!("{} returned FALSE", call)))
    }
}

fn length(len: usize) -> Result<u32, WireError> {
    u32::try_from(len).map_err(|_| WireError::Driver(format!("Transfer of {} bytes too long", len)))
}

impl RegisterDriver for Ch341Library {
    fn version(&self) -> u32 {
        match self.get_version {
            // SAFETY: no arguments, returns a plain integer
            Some(get_version) => unsafe { get_version() },
            None => 0,
        }
    }

    fn open_device(&mut self, index: u32) -> Result<(), WireError> {
        // SAFETY: plain integer argument
        let handle = unsafe { (self.open_device)(index) };
        if handle == INVALID_HANDLE_VALUE || handle == 0 {
            return Err(WireError::Driver(format!("CH341OpenDevice({}) failed", index)));
        }
        Ok(())
    }

    fn close_device(&mut self, index: u32) {
        // SAFETY: plain integer argument
        unsafe { (self.close_device)(index) }
    }

    fn set_stream(&mut self, index: u32, mode: u32) -> Result<(), WireError> {
        let set_stream = self.set_stream.ok_or_else(|| missing("CH341SetStream"))?;
        // SAFETY: plain integer arguments
        check(unsafe { set_stream(index, mode) }, "CH341SetStream")
    }

    fn read_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), WireError> {
        let read_i2c = self.read_i2c.ok_or_else(|| missing("CH341ReadI2C"))?;
        let len = length(buf.len())?;
        // SAFETY: `buf` is valid for `len` writable bytes for the duration of the call
        check(
            unsafe { read_i2c(index, device, register, buf.as_mut_ptr(), len) },
            "CH341ReadI2C",
        )
    }

    fn write_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), WireError> {
        let write_i2c = self.write_i2c.ok_or_else(|| missing("CH341WriteI2C"))?;
        let len = length(data.len())?;
        // SAFETY: the driver only reads `len` bytes from the buffer
        check(
            unsafe { write_i2c(index, device, register, data.as_ptr() as *mut u8, len) },
            "CH341WriteI2C",
        )
    }
}
