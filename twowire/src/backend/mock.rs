//! Recording fakes of both backend seams
//!
//! [`MockBus`] hands out a [`MockCharDevice`] opener for [`StreamAdapter`] and a
//! [`MockRegisterDriver`] loader for [`RegisterAdapter`]. Every call that reaches
//! the fake is logged as a [`BusCall`]; reply bytes are queued with
//! [`MockBus::set_read_data`] and failures injected through [`Faults`].
//!
//! # Example
//!
//! ```
//! use twowire::backend::mock::{BusCall, MockBus};
//! use twowire::TwoWire;
//!
//! let bus = MockBus::new();
//! let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-1"));
//! assert!(wire.begin());
//!
//! wire.begin_transmission(0x6A);
//! wire.write_bytes(&[0x10, 0x40]);
//! assert_eq!(wire.end_transmission(true), 0);
//! assert_eq!(bus.writes(), vec![vec![0x10, 0x40]]);
//! ```

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::register::{DriverLoader, RegisterAdapter, RegisterDriver};
use crate::backend::stream::{CharDevice, StreamAdapter};
use crate::errors::WireError;
use crate::settings::RegisterSettings;

/// Version reported by [`MockRegisterDriver`]
pub const MOCK_DRIVER_VERSION: u32 = 0x0002_0001;

/// One call observed by the fake bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    /// Character device opened
    DeviceOpen { path: PathBuf },
    /// Character device handle dropped
    DeviceClose,
    /// `I2C_SLAVE` control call
    SetSlaveAddress(u8),
    /// Raw stream write
    Write(Vec<u8>),
    /// Raw stream read
    Read { len: usize },
    /// Vendor driver loaded
    DriverLoad,
    OpenDevice { index: u32 },
    CloseDevice { index: u32 },
    SetStream { index: u32, mode: u32 },
    ReadRegister {
        index: u32,
        device: u8,
        register: u8,
        len: usize,
    },
    WriteRegister {
        index: u32,
        device: u8,
        register: u8,
        data: Vec<u8>,
    },
}

/// Failures to inject
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Character device open / driver load fails
    pub open: bool,
    /// `CH341OpenDevice` fails
    pub open_device: bool,
    /// `I2C_SLAVE` fails (device busy, NAK)
    pub address: bool,
    /// Stream write accepts only this many bytes
    pub short_write: Option<usize>,
    /// Stream write / register write fails
    pub write: bool,
    /// Stream read / register read fails
    pub read: bool,
    /// `CH341SetStream` fails
    pub set_stream: bool,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<BusCall>,
    read_data: VecDeque<u8>,
    faults: Faults,
}

/// Shared state behind the fakes
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl MockBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: BusCall) {
        self.lock().calls.push(call);
    }

    /// Get call log
    pub fn calls(&self) -> Vec<BusCall> {
        self.lock().calls.clone()
    }

    /// Clear call log
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Payloads of every successful stream write and register write, in order
    ///
    /// Register writes are reported as `[register, data..]` so both backends
    /// can be compared against the same flat transmission buffer.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BusCall::Write(data) => Some(data.clone()),
                BusCall::WriteRegister { register, data, .. } => {
                    let mut flat = vec![*register];
                    flat.extend_from_slice(data);
                    Some(flat)
                }
                _ => None,
            })
            .collect()
    }

    /// Queue bytes returned by subsequent reads
    pub fn set_read_data(&self, data: &[u8]) {
        self.lock().read_data.extend(data.iter().copied());
    }

    /// Bytes still queued for reads
    pub fn pending_read_data(&self) -> usize {
        self.lock().read_data.len()
    }

    /// Adjust injected failures
    pub fn set_faults(&self, update: impl FnOnce(&mut Faults)) {
        update(&mut self.lock().faults);
    }

    /// Build a [`StreamAdapter`] whose device opener is backed by this bus
    pub fn stream_adapter(&self, device_path: impl Into<PathBuf>) -> StreamAdapter {
        let bus = self.clone();
        StreamAdapter::with_opener(
            device_path,
            Box::new(move |path: &Path| {
                let device = MockCharDevice::open(bus.clone(), path)?;
                Ok(Box::new(device) as Box<dyn CharDevice>)
            }),
        )
    }

    /// Build a [`RegisterAdapter`] whose driver loader is backed by this bus
    pub fn register_adapter(&self, settings: RegisterSettings) -> RegisterAdapter {
        let bus = self.clone();
        let loader: DriverLoader = Box::new(move || {
            let driver = MockRegisterDriver::load(bus.clone())?;
            Ok(Box::new(driver) as Box<dyn RegisterDriver>)
        });
        RegisterAdapter::with_loader(settings, loader)
    }

    fn pop_read_data(&self, max: usize) -> Vec<u8> {
        let mut state = self.lock();
        let count = max.min(state.read_data.len());
        state.read_data.drain(..count).collect()
    }
}

/// Fake i2c-dev node
#[derive(Debug)]
pub struct MockCharDevice {
    bus: MockBus,
}

impl MockCharDevice {
    fn open(bus: MockBus, path: &Path) -> io::Result<Self> {
        if bus.lock().faults.open {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mock: permission denied",
            ));
        }
        bus.record(BusCall::DeviceOpen {
            path: path.to_path_buf(),
        });
        Ok(Self { bus })
    }
}

impl Drop for MockCharDevice {
    fn drop(&mut self) {
        self.bus.record(BusCall::DeviceClose);
    }
}

impl CharDevice for MockCharDevice {
    fn set_slave_address(&mut self, address: u8) -> io::Result<()> {
        if self.bus.lock().faults.address {
            return Err(io::Error::new(io::ErrorKind::ResourceBusy, "mock: device busy"));
        }
        self.bus.record(BusCall::SetSlaveAddress(address));
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        let faults = self.bus.lock().faults.clone();
        if faults.write {
            return Err(io::Error::new(io::ErrorKind::Other, "mock: remote I/O error"));
        }
        let accepted = faults.short_write.unwrap_or(data.len()).min(data.len());
        self.bus.record(BusCall::Write(data[..accepted].to_vec()));
        Ok(accepted)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.bus.lock().faults.read {
            return Err(io::Error::new(io::ErrorKind::Other, "mock: remote I/O error"));
        }
        self.bus.record(BusCall::Read { len: buf.len() });
        let data = self.bus.pop_read_data(buf.len());
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

/// Fake CH341 driver
///
/// Register reads always deliver the full length; bytes not covered by queued
/// read data come back as zero.
#[derive(Debug)]
pub struct MockRegisterDriver {
    bus: MockBus,
}

impl MockRegisterDriver {
    fn load(bus: MockBus) -> Result<Self, WireError> {
        if bus.lock().faults.open {
            return Err(WireError::ResourceUnavailable(
                "mock: driver not loadable".to_string(),
            ));
        }
        bus.record(BusCall::DriverLoad);
        Ok(Self { bus })
    }
}

impl RegisterDriver for MockRegisterDriver {
    fn version(&self) -> u32 {
        MOCK_DRIVER_VERSION
    }

    fn open_device(&mut self, index: u32) -> Result<(), WireError> {
        if self.bus.lock().faults.open_device {
            return Err(WireError::Driver("mock: no device".to_string()));
        }
        self.bus.record(BusCall::OpenDevice { index });
        Ok(())
    }

    fn close_device(&mut self, index: u32) {
        self.bus.record(BusCall::CloseDevice { index });
    }

    fn set_stream(&mut self, index: u32, mode: u32) -> Result<(), WireError> {
        if self.bus.lock().faults.set_stream {
            return Err(WireError::Driver("mock: CH341SetStream returned FALSE".to_string()));
        }
        self.bus.record(BusCall::SetStream { index, mode });
        Ok(())
    }

    fn read_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), WireError> {
        if self.bus.lock().faults.read {
            return Err(WireError::Driver("mock: CH341ReadI2C returned FALSE".to_string()));
        }
        self.bus.record(BusCall::ReadRegister {
            index,
            device,
            register,
            len: buf.len(),
        });
        let data = self.bus.pop_read_data(buf.len());
        buf.fill(0);
        buf[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    fn write_i2c(
        &mut self,
        index: u32,
        device: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), WireError> {
        if self.bus.lock().faults.write {
            return Err(WireError::Driver("mock: CH341WriteI2C returned FALSE".to_string()));
        }
        self.bus.record(BusCall::WriteRegister {
            index,
            device,
            register,
            data: data.to_vec(),
        });
        Ok(())
    }
}
