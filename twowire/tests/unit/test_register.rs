//! Register-call backend tests

use twowire::backend::mock::{BusCall, MockBus};
use twowire::backend::{Backend, RegisterAdapter};
use twowire::settings::RegisterSettings;
use twowire::{TwoWire, TRANSMISSION_FAILED, TRANSMISSION_OK};

fn open_wire(bus: &MockBus) -> TwoWire<RegisterAdapter> {
    let mut wire = TwoWire::new(bus.register_adapter(RegisterSettings::default()));
    assert!(wire.begin());
    bus.clear_calls();
    wire
}

#[test]
fn test_begin_loads_opens_and_sets_i2c_mode() {
    let bus = MockBus::new();
    let mut wire = TwoWire::new(bus.register_adapter(RegisterSettings::default()));

    assert!(wire.begin());
    assert_eq!(
        bus.calls(),
        vec![
            BusCall::DriverLoad,
            BusCall::OpenDevice { index: 0 },
            BusCall::SetStream { index: 0, mode: 1 },
        ]
    );
}

#[test]
fn test_pointer_select_then_read() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);
    bus.set_read_data(&[0x6B]);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x0F);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);
    // Pointer select alone does not touch the device
    assert!(bus.calls().is_empty());
    assert_eq!(wire.backend().last_register_address(), 0x0F);

    assert_eq!(wire.request_from(0x6A, 1, true), 1);
    assert_eq!(wire.read(), 0x6B);
    assert_eq!(
        bus.calls(),
        vec![BusCall::ReadRegister {
            index: 0,
            device: 0x6A,
            register: 0x0F,
            len: 1
        }]
    );
}

#[test]
fn test_pointer_select_overrides_previous_register() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x28);
    wire.end_transmission(true);
    wire.request_from(0x6A, 1, true);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x0F);
    wire.end_transmission(true);
    wire.request_from(0x6A, 1, true);

    let registers: Vec<u8> = bus
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BusCall::ReadRegister { register, .. } => Some(register),
            _ => None,
        })
        .collect();
    assert_eq!(registers, vec![0x28, 0x0F]);
}

#[test]
fn test_multi_byte_write_splits_register() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x10, 0x40, 0x41]);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);

    assert_eq!(
        bus.calls(),
        vec![BusCall::WriteRegister {
            index: 0,
            device: 0x6A,
            register: 0x10,
            data: vec![0x40, 0x41]
        }]
    );
    // Writes leave the read pointer alone
    assert_eq!(wire.backend().last_register_address(), 0);
}

#[test]
fn test_missing_pointer_select_reads_stale_register() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x22);
    wire.end_transmission(true);
    wire.request_from(0x6A, 1, true);
    bus.clear_calls();

    // No pointer select: still reads 0x22, on whatever device is asked
    wire.request_from(0x6B, 2, true);
    assert_eq!(
        bus.calls(),
        vec![BusCall::ReadRegister {
            index: 0,
            device: 0x6B,
            register: 0x22,
            len: 2
        }]
    );
}

#[test]
fn test_empty_transmission_makes_no_call() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_OK);
    assert!(bus.calls().is_empty());
}

#[test]
fn test_set_stream_failure_closes_device() {
    let bus = MockBus::new();
    bus.set_faults(|f| f.set_stream = true);
    let mut wire = TwoWire::new(bus.register_adapter(RegisterSettings::default()));

    assert!(!wire.begin());
    assert!(!wire.backend().is_open());
    assert_eq!(
        bus.calls(),
        vec![
            BusCall::DriverLoad,
            BusCall::OpenDevice { index: 0 },
            BusCall::CloseDevice { index: 0 },
        ]
    );

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x10, 0x40]);
    assert_eq!(wire.end_transmission(true), TRANSMISSION_FAILED);
}

#[test]
fn test_open_device_failure() {
    let bus = MockBus::new();
    bus.set_faults(|f| f.open_device = true);
    let mut wire = TwoWire::new(bus.register_adapter(RegisterSettings::default()));

    assert!(!wire.begin());
    assert_eq!(bus.calls(), vec![BusCall::DriverLoad]);
}

#[test]
fn test_end_closes_device_and_reopen_resets_pointer() {
    let bus = MockBus::new();
    let mut wire = open_wire(&bus);

    wire.begin_transmission(0x6A);
    wire.write_byte(0x0F);
    wire.end_transmission(true);
    assert_eq!(wire.backend().last_register_address(), 0x0F);

    wire.end();
    wire.end();
    assert_eq!(bus.calls(), vec![BusCall::CloseDevice { index: 0 }]);

    assert!(wire.begin());
    assert_eq!(wire.backend().last_register_address(), 0);
}

#[test]
fn test_custom_device_index() {
    let bus = MockBus::new();
    let settings = RegisterSettings {
        device_index: 2,
        ..Default::default()
    };
    let mut wire = TwoWire::new(bus.register_adapter(settings));
    assert!(wire.begin());
    bus.clear_calls();

    wire.begin_transmission(0x6A);
    wire.write_bytes(&[0x11, 0x40]);
    wire.end_transmission(true);

    assert_eq!(
        bus.calls(),
        vec![BusCall::WriteRegister {
            index: 2,
            device: 0x6A,
            register: 0x11,
            data: vec![0x40]
        }]
    );
}
