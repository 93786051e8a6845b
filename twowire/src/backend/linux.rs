//! Linux i2c-dev character device

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::backend::stream::CharDevice;

/// `I2C_SLAVE` request from `linux/i2c-dev.h`
const I2C_SLAVE: u16 = 0x0703;

nix::ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);

/// An opened `/dev/i2c-N` node
#[derive(Debug)]
pub struct LinuxCharDevice {
    path: PathBuf,
    file: File,
}

impl LinuxCharDevice {
    /// Open the device read-write
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Get device path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CharDevice for LinuxCharDevice {
    fn set_slave_address(&mut self, address: u8) -> io::Result<()> {
        // SAFETY: the fd is owned by `self.file` and stays open for the call
        unsafe { set_i2c_slave_address(self.file.as_raw_fd(), i32::from(address)) }
            .map(|_| ())
            .map_err(io::Error::from)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
