//! TwoWire
//!
//! Arduino-style buffered I2C transactions on desktop hosts. One API, two
//! backends picked by host OS:
//!
//! - Linux: `/dev/i2c-N` via `ioctl(I2C_SLAVE)` + raw read/write
//! - Windows: CH341 USB-to-I2C bridge via its vendor DLL
//!
//! ```no_run
//! use twowire::{Settings, TwoWire};
//!
//! let mut wire = TwoWire::for_host(&Settings::default())?;
//! if wire.begin() {
//!     wire.begin_transmission(0x6A);
//!     wire.write_byte(0x0F);
//!     wire.end_transmission(true);
//!
//!     if wire.request_from(0x6A, 1, true) == 1 {
//!         println!("WHO_AM_I = 0x{:02x}", wire.read());
//!     }
//!     wire.end();
//! }
//! # Ok::<(), twowire::WireError>(())
//! ```

pub mod backend;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod platform;
pub mod sensor;
pub mod settings;
pub mod utils;
pub mod wire;

pub use errors::WireError;
pub use platform::Platform;
pub use settings::Settings;
pub use wire::{TwoWire, EMPTY_READ, MAX_REQUEST_LEN, TRANSMISSION_FAILED, TRANSMISSION_OK};
