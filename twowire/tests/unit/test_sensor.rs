//! ISM330DHCX driver tests over the fake bus

use twowire::backend::mock::{BusCall, MockBus};
use twowire::backend::{RegisterAdapter, StreamAdapter};
use twowire::sensor::ism330dhcx::{
    self, ReadMode, SensorConfig, ADDRESS_HIGH, ADDRESS_LOW, DEVICE_ID,
};
use twowire::sensor::{read_register, read_registers};
use twowire::settings::RegisterSettings;
use twowire::{TwoWire, WireError};

fn stream_wire(bus: &MockBus) -> TwoWire<StreamAdapter> {
    let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-1"));
    assert!(wire.begin());
    bus.clear_calls();
    wire
}

fn register_wire(bus: &MockBus) -> TwoWire<RegisterAdapter> {
    let mut wire = TwoWire::new(bus.register_adapter(RegisterSettings::default()));
    assert!(wire.begin());
    bus.clear_calls();
    wire
}

/// Output register contents: accel X=1, Y=-1, Z=0x1234; gyro X=-2, Y=0, Z=0x7FFF
const ACCEL_BYTES: [u8; 6] = [0x01, 0x00, 0xFF, 0xFF, 0x34, 0x12];
const GYRO_BYTES: [u8; 6] = [0xFE, 0xFF, 0x00, 0x00, 0xFF, 0x7F];

#[test]
fn test_probe_prefers_first_matching_address() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_read_data(&[DEVICE_ID]);

    assert_eq!(
        ism330dhcx::probe(&mut wire, &[ADDRESS_LOW, ADDRESS_HIGH]),
        Some(ADDRESS_LOW)
    );
    assert_eq!(
        bus.calls(),
        vec![
            BusCall::SetSlaveAddress(ADDRESS_LOW),
            BusCall::Write(vec![ism330dhcx::WHO_AM_I]),
            BusCall::SetSlaveAddress(ADDRESS_LOW),
            BusCall::Read { len: 1 },
        ]
    );
}

#[test]
fn test_probe_skips_wrong_identity() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_read_data(&[0x00, DEVICE_ID]);

    assert_eq!(
        ism330dhcx::probe(&mut wire, &[ADDRESS_LOW, ADDRESS_HIGH]),
        Some(ADDRESS_HIGH)
    );
}

#[test]
fn test_probe_without_answer() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);

    // Nothing queued: every read comes back empty
    assert_eq!(ism330dhcx::probe(&mut wire, &[ADDRESS_LOW, ADDRESS_HIGH]), None);

    bus.set_faults(|f| f.address = true);
    assert_eq!(ism330dhcx::probe(&mut wire, &[ADDRESS_LOW]), None);
}

#[test]
fn test_verify_identity_mismatch() {
    let bus = MockBus::new();
    let mut wire = register_wire(&bus);
    bus.set_read_data(&[0x6C]);

    assert!(matches!(
        ism330dhcx::verify_identity(&mut wire, ADDRESS_HIGH),
        Err(WireError::SensorError(_))
    ));

    bus.set_read_data(&[DEVICE_ID]);
    assert!(ism330dhcx::verify_identity(&mut wire, ADDRESS_HIGH).is_ok());
}

#[test]
fn test_probe_on_register_backend() {
    let bus = MockBus::new();
    let mut wire = register_wire(&bus);
    bus.set_read_data(&[DEVICE_ID]);

    assert_eq!(ism330dhcx::probe(&mut wire, &[ADDRESS_HIGH]), Some(ADDRESS_HIGH));
    assert_eq!(
        bus.calls(),
        vec![BusCall::ReadRegister {
            index: 0,
            device: ADDRESS_HIGH,
            register: ism330dhcx::WHO_AM_I,
            len: 1
        }]
    );
}

#[test]
fn test_configure_write_sequence() {
    let bus = MockBus::new();
    let mut wire = register_wire(&bus);

    ism330dhcx::configure(&mut wire, ADDRESS_HIGH, &SensorConfig::default()).unwrap();
    assert_eq!(
        bus.writes(),
        vec![
            vec![ism330dhcx::CTRL3_C, ism330dhcx::CTRL3_C_SW_RESET],
            vec![ism330dhcx::CTRL1_XL, 0x40],
            vec![ism330dhcx::CTRL2_G, 0x40],
            vec![ism330dhcx::CTRL3_C, ism330dhcx::CTRL3_C_IF_INC_BDU],
        ]
    );
}

#[test]
fn test_configure_stops_on_write_failure() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_faults(|f| f.write = true);

    let result = ism330dhcx::configure(&mut wire, ADDRESS_HIGH, &SensorConfig::default());
    assert!(result.is_err());
    assert!(bus.writes().is_empty());
}

#[test]
fn test_read_sample_per_register() {
    let bus = MockBus::new();
    let mut wire = register_wire(&bus);
    bus.set_read_data(&ACCEL_BYTES);
    bus.set_read_data(&GYRO_BYTES);

    let sample = ism330dhcx::read_sample(&mut wire, ADDRESS_HIGH, ReadMode::PerRegister).unwrap();
    assert_eq!(sample.accel, [1, -1, 0x1234]);
    assert_eq!(sample.gyro, [-2, 0, i16::MAX]);

    let registers: Vec<u8> = bus
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BusCall::ReadRegister { register, len, .. } => {
                assert_eq!(len, 1);
                Some(register)
            }
            _ => None,
        })
        .collect();
    let expected: Vec<u8> = (0x28..0x2E).chain(0x22..0x28).collect();
    assert_eq!(registers, expected);
}

#[test]
fn test_read_sample_burst() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_read_data(&ACCEL_BYTES);
    bus.set_read_data(&GYRO_BYTES);

    let sample = ism330dhcx::read_sample(&mut wire, ADDRESS_LOW, ReadMode::Burst).unwrap();
    assert_eq!(sample.accel, [1, -1, 0x1234]);
    assert_eq!(sample.gyro, [-2, 0, i16::MAX]);
    assert_eq!(
        bus.writes(),
        vec![vec![ism330dhcx::OUTX_L_A], vec![ism330dhcx::OUTX_L_G]]
    );
}

#[test]
fn test_short_read_is_reception_error() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_read_data(&ACCEL_BYTES[..3]);

    let result = ism330dhcx::read_sample(&mut wire, ADDRESS_LOW, ReadMode::Burst);
    assert!(matches!(result, Err(WireError::Reception(_))));
}

#[test]
fn test_read_discards_stale_bytes() {
    let bus = MockBus::new();
    let mut wire = stream_wire(&bus);
    bus.set_read_data(&[0xAA, 0xBB]);
    assert_eq!(wire.request_from(ADDRESS_LOW, 2, true), 2);

    bus.set_read_data(&[DEVICE_ID]);
    assert_eq!(
        read_register(&mut wire, ADDRESS_LOW, ism330dhcx::WHO_AM_I).unwrap(),
        DEVICE_ID
    );
    assert_eq!(wire.available(), 0);
}

#[test]
fn test_read_registers_requires_session() {
    let bus = MockBus::new();
    let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-1"));

    assert!(matches!(
        read_registers(&mut wire, ADDRESS_LOW, ism330dhcx::WHO_AM_I, 1),
        Err(WireError::NotInitialized)
    ));
}
