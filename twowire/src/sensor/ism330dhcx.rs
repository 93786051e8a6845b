//! ST ISM330DHCX 6-axis IMU (accelerometer + gyroscope)

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::errors::WireError;
use crate::sensor::{read_register, read_registers, write_register};
use crate::wire::TwoWire;

/// SA0 pulled low
pub const ADDRESS_LOW: u8 = 0x6A;
/// SA0 pulled high (default on breakout boards)
pub const ADDRESS_HIGH: u8 = 0x6B;

pub const WHO_AM_I: u8 = 0x0F;
/// Expected WHO_AM_I value
pub const DEVICE_ID: u8 = 0x6B;

/// Accelerometer control: ODR and full scale
pub const CTRL1_XL: u8 = 0x10;
/// Gyroscope control: ODR and full scale
pub const CTRL2_G: u8 = 0x11;
/// Interface control: reset, auto-increment, block data update
pub const CTRL3_C: u8 = 0x12;

/// First gyroscope output register (X low byte), six bytes X/Y/Z little-endian
pub const OUTX_L_G: u8 = 0x22;
/// First accelerometer output register (X low byte), six bytes X/Y/Z little-endian
pub const OUTX_L_A: u8 = 0x28;

/// CTRL3_C: software reset
pub const CTRL3_C_SW_RESET: u8 = 0x01;
/// CTRL3_C: IF_INC (auto-increment) + BDU (block data update)
pub const CTRL3_C_IF_INC_BDU: u8 = 0x44;

/// 104 Hz, +-2 g
pub const CTRL1_XL_104HZ_2G: u8 = 0x40;
/// 104 Hz, +-250 dps
pub const CTRL2_G_104HZ_250DPS: u8 = 0x40;

/// g per LSB at +-2 g
pub const ACCEL_SCALE_2G: f32 = 0.000061;
/// dps per LSB at +-250 dps
pub const GYRO_SCALE_250DPS: f32 = 0.00875;

const RESET_SETTLE: Duration = Duration::from_millis(10);

/// Output data rate / full scale selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    /// CTRL1_XL value
    pub accel_ctrl: u8,
    /// CTRL2_G value
    pub gyro_ctrl: u8,
    /// g per LSB matching `accel_ctrl`
    pub accel_scale: f32,
    /// dps per LSB matching `gyro_ctrl`
    pub gyro_scale: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            accel_ctrl: CTRL1_XL_104HZ_2G,
            gyro_ctrl: CTRL2_G_104HZ_250DPS,
            accel_scale: ACCEL_SCALE_2G,
            gyro_scale: GYRO_SCALE_250DPS,
        }
    }
}

/// How output registers are fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// One pointer select + one-byte read per register. Works on every backend.
    #[default]
    PerRegister,
    /// One pointer select + six-byte read, relying on IF_INC
    Burst,
}

/// Raw output counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

impl RawSample {
    /// Acceleration in g
    pub fn accel_g(&self, config: &SensorConfig) -> [f32; 3] {
        self.accel.map(|v| f32::from(v) * config.accel_scale)
    }

    /// Angular rate in degrees per second
    pub fn gyro_dps(&self, config: &SensorConfig) -> [f32; 3] {
        self.gyro.map(|v| f32::from(v) * config.gyro_scale)
    }
}

/// Combine X/Y/Z little-endian byte pairs into signed counts
pub fn combine_axes(bytes: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_le_bytes([bytes[0], bytes[1]]),
        i16::from_le_bytes([bytes[2], bytes[3]]),
        i16::from_le_bytes([bytes[4], bytes[5]]),
    ]
}

/// Check that the device at `address` identifies as an ISM330DHCX
pub fn verify_identity<B: Backend>(wire: &mut TwoWire<B>, address: u8) -> Result<(), WireError> {
    let id = read_register(wire, address, WHO_AM_I)?;
    if id != DEVICE_ID {
        return Err(WireError::SensorError(format!(
            "Device at 0x{:02x} reports WHO_AM_I 0x{:02x}, expected 0x{:02x}",
            address, id, DEVICE_ID
        )));
    }
    Ok(())
}

/// First of `candidates` whose WHO_AM_I reads [`DEVICE_ID`]
pub fn probe<B: Backend>(wire: &mut TwoWire<B>, candidates: &[u8]) -> Option<u8> {
    candidates
        .iter()
        .copied()
        .find(|&address| match verify_identity(wire, address) {
            Ok(()) => {
                info!("ISM330DHCX found at address 0x{:02x}", address);
                true
            }
            Err(e) => {
                debug!("No ISM330DHCX at 0x{:02x}: {}", address, e);
                false
            }
        })
}

/// Reset the sensor and apply `config`
pub fn configure<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    config: &SensorConfig,
) -> Result<(), WireError> {
    write_register(wire, address, CTRL3_C, CTRL3_C_SW_RESET)?;
    thread::sleep(RESET_SETTLE);

    write_register(wire, address, CTRL1_XL, config.accel_ctrl)?;
    write_register(wire, address, CTRL2_G, config.gyro_ctrl)?;
    write_register(wire, address, CTRL3_C, CTRL3_C_IF_INC_BDU)?;

    info!(
        "ISM330DHCX at 0x{:02x} configured: CTRL1_XL=0x{:02x} CTRL2_G=0x{:02x}",
        address, config.accel_ctrl, config.gyro_ctrl
    );
    Ok(())
}

fn read_axes<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    first_register: u8,
    mode: ReadMode,
) -> Result<[i16; 3], WireError> {
    let mut bytes = [0u8; 6];
    match mode {
        ReadMode::PerRegister => {
            for (offset, byte) in (0u8..).zip(bytes.iter_mut()) {
                *byte = read_register(wire, address, first_register + offset)?;
            }
        }
        ReadMode::Burst => {
            let data = read_registers(wire, address, first_register, bytes.len())?;
            bytes.copy_from_slice(&data);
        }
    }
    Ok(combine_axes(&bytes))
}

/// Read accelerometer then gyroscope output
pub fn read_sample<B: Backend>(
    wire: &mut TwoWire<B>,
    address: u8,
    mode: ReadMode,
) -> Result<RawSample, WireError> {
    let accel = read_axes(wire, address, OUTX_L_A, mode)?;
    let gyro = read_axes(wire, address, OUTX_L_G, mode)?;
    Ok(RawSample { accel, gyro })
}
