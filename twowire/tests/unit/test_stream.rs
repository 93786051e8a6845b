//! Byte-stream backend tests

use std::path::PathBuf;

use twowire::backend::mock::{BusCall, MockBus};
use twowire::backend::{Backend, StreamAdapter};
use twowire::{TwoWire, WireError, TRANSMISSION_FAILED, TRANSMISSION_OK};

fn open_wire(bus: &MockBus) -> TwoWire<StreamAdapter> {
    let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-1"));
    assert!(wire.begin());
    bus.clear_calls();
    wire
}

#[test]
fn test_begin_opens_device_path() {
    let bus = MockBus::new();
    let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-16"));
    assert!(wire.begin());
    assert_eq!(
        bus.calls(),
        vec![BusCall::DeviceOpen {
            path: PathBuf::from("/dev/i2c-16")
        }]
    );
}

#[test]
fn test_write_is_one_address_select_and_one_write() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x10, 0x40]);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);

    assert_eq!(
        bus.calls(),
        vec![
            BusCall::SetSlaveAddress(0x6A),
            BusCall::Write(vec![0x10, 0x40]),
        ]
    );
}

#[test]
fn test_single_byte_is_plain_payload() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x0F);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);

    assert_eq!(
        bus.calls(),
        vec![BusCall::SetSlaveAddress(0x6A), BusCall::Write(vec![0x0F])]
    );
}

#[test]
fn test_empty_transmission_only_selects_address() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6B);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);
    assert_eq!(bus.calls(), vec![BusCall::SetSlaveAddress(0x6B)]);
}

#[test]
fn test_short_write_is_hard_failure() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);
    bus.set_faults(|f| f.short_write = Some(1));

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x10, 0x40, 0x41]);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_FAILED);
    assert!(matches!(
        wire.try_end_transmission(true),
        Err(WireError::ShortWrite {
            expected: 3,
            written: 1
        })
    ));
}

#[test]
fn test_address_select_failure_skips_write() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);
    bus.set_faults(|f| f.address = true);

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x10, 0x40]);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_FAILED);
    assert!(bus.calls().is_empty());

    assert_eq!(wire.request_from(0x6A, 1, true), 0);
}

#[test]
fn test_request_selects_address_then_reads() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);
    bus.set_read_data(&[0x6B]);

    assert_eq!(wire.request_from(0x6B, 1, true), 1);
    assert_eq!(
        bus.calls(),
        vec![BusCall::SetSlaveAddress(0x6B), BusCall::Read { len: 1 }]
    );
}

#[test]
fn test_partial_read_returns_received_count() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);
    bus.set_read_data(&[0xA0, 0xA1]);

    assert_eq!(wire.request_from(0x6A, 6, true), 2);
    assert_eq!(wire.available(), 2);
    assert_eq!(wire.read(), 0xA0);
    assert_eq!(wire.read(), 0xA1);
    assert_eq!(wire.read(), twowire::EMPTY_READ);
}

#[test]
fn test_begin_twice_closes_prior_handle() {
    let bus = MockBus::new();
    let mut wire = TwoWire::new(bus.stream_adapter("/dev/i2c-1"));

    assert!(wire.begin());
    assert!(wire.begin());
    assert!(wire.backend().is_open());

    let path = PathBuf::from("/dev/i2c-1");
    assert_eq!(
        bus.calls(),
        vec![
            BusCall::DeviceOpen { path: path.clone() },
            BusCall::DeviceClose,
            BusCall::DeviceOpen { path },
        ]
    );
}

#[test]
fn test_end_closes_device() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.end();
    assert!(!wire.backend().is_open());
    assert_eq!(bus.calls(), vec![BusCall::DeviceClose]);
}
