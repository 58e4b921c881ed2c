use std::collections::VecDeque;

use embassy_futures::block_on;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
use veml6070_driver::{
    address, AcknowledgeMode, BusProvider, BusState, CommandField, CommandRegisterError,
    IntegrationTime, RiskLevel, SensorError, SensorState, UvIndex, Veml6070, Veml6070Builder,
};

/// Hands out scripted mock buses in order and records open/close calls.
#[derive(Default)]
struct MockProvider {
    buses: VecDeque<I2cMock>,
    open_error: Option<ErrorKind>,
    close_error: Option<ErrorKind>,
    opened: Vec<u8>,
    closed: usize,
}

impl MockProvider {
    fn with_buses(buses: &[&I2cMock]) -> Self {
        Self {
            buses: buses.iter().map(|bus| (*bus).clone()).collect(),
            ..Default::default()
        }
    }
}

impl BusProvider for MockProvider {
    type Bus = I2cMock;

    async fn open(&mut self, bus_number: u8) -> Result<I2cMock, ErrorKind> {
        if let Some(e) = self.open_error.take() {
            return Err(e);
        }
        self.opened.push(bus_number);
        Ok(self.buses.pop_front().expect("no scripted bus left"))
    }

    async fn close(&mut self, _bus: I2cMock) -> Result<(), ErrorKind> {
        if let Some(e) = self.close_error.take() {
            return Err(e);
        }
        self.closed += 1;
        Ok(())
    }
}

/// Accumulates the requested delay instead of sleeping.
#[derive(Default)]
struct RecordingDelay {
    total_ns: u64,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

fn commit(byte: u8) -> [Transaction; 2] {
    [
        Transaction::read(address::AR, vec![0x00]),
        Transaction::write(address::CMD, vec![byte]),
    ]
}

const ACTIVE_1T: u8 = 0x06;
const SHUTDOWN_1T: u8 = 0x07;

#[test]
fn enable_opens_bus_and_activates_sensor() {
    let mut bus = I2cMock::new(&commit(ACTIVE_1T));
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();

    assert_eq!(sensor.state(), SensorState::Enabled);
    assert_eq!(sensor.bus_state(), BusState::Open);
    assert_eq!(sensor.command_register().to_byte(), ACTIVE_1T);
    assert_eq!(sensor.release().opened, vec![1]);
    bus.done();
}

#[test]
fn enable_disable_enable_round_trip() {
    let first: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        .chain(commit(SHUTDOWN_1T))
        .collect();
    let mut first_bus = I2cMock::new(&first);
    let mut second_bus = I2cMock::new(&commit(ACTIVE_1T));
    let provider = MockProvider::with_buses(&[&first_bus, &second_bus]);
    let mut sensor = Veml6070::new(provider, Default::default());

    block_on(sensor.enable()).unwrap();
    block_on(sensor.disable()).unwrap();
    assert_eq!(sensor.state(), SensorState::Disabled);
    assert_eq!(sensor.bus_state(), BusState::Closed);

    block_on(sensor.enable()).unwrap();
    assert_eq!(sensor.state(), SensorState::Enabled);
    assert_eq!(sensor.bus_state(), BusState::Open);

    let provider = sensor.release();
    assert_eq!(provider.opened, vec![1, 1]);
    assert_eq!(provider.closed, 1);
    first_bus.done();
    second_bus.done();
}

#[test]
fn enable_twice_is_rejected() {
    let mut bus = I2cMock::new(&commit(ACTIVE_1T));
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();
    assert_eq!(
        block_on(sensor.enable()),
        Err(SensorError::InvalidState {
            expected: SensorState::Disabled,
            actual: SensorState::Enabled
        })
    );
    bus.done();
}

#[test]
fn enable_applies_configured_settings() {
    // reserved | IT = 2T | ACK
    let mut bus = I2cMock::new(&commit(0b0010_1010));
    let config = Veml6070Builder::new()
        .bus_number(4)
        .integration_time(IntegrationTime::TwoT)
        .acknowledge_mode(AcknowledgeMode::Enabled)
        .build();
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), config);

    block_on(sensor.enable()).unwrap();

    assert_eq!(sensor.integration_time(), IntegrationTime::TwoT);
    assert_eq!(sensor.acknowledge_mode(), AcknowledgeMode::Enabled);
    assert_eq!(sensor.refresh_time_ms(), 225.0);
    assert_eq!(sensor.release().opened, vec![4]);
    bus.done();
}

#[test]
fn initialize_returns_enabled_sensor() {
    let mut bus = I2cMock::new(&commit(ACTIVE_1T));

    let sensor =
        block_on(Veml6070::initialize(MockProvider::with_buses(&[&bus]), Default::default()))
            .unwrap();

    assert_eq!(sensor.state(), SensorState::Enabled);
    bus.done();
}

#[test]
fn open_failure_leaves_sensor_disabled() {
    let provider = MockProvider {
        open_error: Some(ErrorKind::Bus),
        ..Default::default()
    };
    let mut sensor = Veml6070::new(provider, Default::default());

    assert_eq!(
        block_on(sensor.enable()),
        Err(SensorError::Open(ErrorKind::Bus))
    );
    assert_eq!(sensor.state(), SensorState::Disabled);
    assert_eq!(sensor.bus_state(), BusState::Closed);
}

#[test]
fn failed_enable_commit_closes_bus_again() {
    let mut bus = I2cMock::new(&[
        Transaction::read(address::AR, vec![0x00]),
        Transaction::write(address::CMD, vec![ACTIVE_1T]).with_error(ErrorKind::Other),
    ]);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    assert_eq!(
        block_on(sensor.enable()),
        Err(SensorError::Write(ErrorKind::Other))
    );
    assert_eq!(sensor.state(), SensorState::Disabled);
    assert_eq!(sensor.bus_state(), BusState::Closed);
    assert_eq!(sensor.release().closed, 1);
    bus.done();
}

#[test]
fn ack_clear_failure_is_ignored_by_default() {
    let mut bus = I2cMock::new(&[
        Transaction::read(address::AR, vec![0x00]).with_error(ErrorKind::Other),
        Transaction::write(address::CMD, vec![ACTIVE_1T]),
    ]);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();

    assert_eq!(sensor.state(), SensorState::Enabled);
    bus.done();
}

#[test]
fn ack_clear_failure_surfaces_when_not_ignored() {
    let mut bus = I2cMock::new(&[
        Transaction::read(address::AR, vec![0x00]).with_error(ErrorKind::Other)
    ]);
    let config = Veml6070Builder::new().ignore_ack_error(false).build();
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), config);

    assert_eq!(
        block_on(sensor.enable()),
        Err(SensorError::ClearAck(ErrorKind::Other))
    );
    assert_eq!(sensor.state(), SensorState::Disabled);
    bus.done();
}

#[test]
fn read_while_disabled_touches_no_bus() {
    let mut sensor = Veml6070::new(MockProvider::default(), Default::default());
    let mut delay = RecordingDelay::default();

    assert_eq!(
        block_on(sensor.read(&mut delay)),
        Err(SensorError::InvalidState {
            expected: SensorState::Enabled,
            actual: SensorState::Disabled
        })
    );
    assert_eq!(delay.total_ns, 0);
    assert!(sensor.release().opened.is_empty());
}

#[test]
fn read_waits_refresh_time_and_combines_bytes() {
    let expectations: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        .chain([
            Transaction::read(address::DATA_MSB, vec![0x02]),
            Transaction::read(address::DATA_LSB, vec![0x58]),
        ])
        .collect();
    let mut bus = I2cMock::new(&expectations);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());
    let mut delay = RecordingDelay::default();

    block_on(sensor.enable()).unwrap();
    let value = block_on(sensor.read(&mut delay)).unwrap();

    assert_eq!(delay.total_ns, 112_500_000);
    assert_eq!(value.raw_value(), 600);
    assert_eq!(value.normalized_value(), 600.0);
    assert_eq!(value.uv_index(), UvIndex(3));
    assert_eq!(value.risk_level(), RiskLevel::Moderate);
    bus.done();
}

#[test]
fn read_uses_active_integration_time() {
    let expectations: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        // reserved | IT = 4T
        .chain(commit(0b0000_1110))
        .chain([
            Transaction::read(address::DATA_MSB, vec![0x20]),
            Transaction::read(address::DATA_LSB, vec![0xD0]),
        ])
        .collect();
    let mut bus = I2cMock::new(&expectations);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());
    let mut delay = RecordingDelay::default();

    block_on(sensor.enable()).unwrap();
    block_on(sensor.set_integration_time(IntegrationTime::FourT)).unwrap();
    let value = block_on(sensor.read(&mut delay)).unwrap();

    assert_eq!(delay.total_ns, 450_000_000);
    assert_eq!(value.raw_value(), 0x20D0);
    assert_eq!(value.normalized_value(), 2100.0);
    assert_eq!(value.uv_index(), UvIndex(11));
    assert_eq!(value.risk_level(), RiskLevel::Extreme);
    assert_eq!(sensor.config().integration_time, IntegrationTime::FourT);
    bus.done();
}

#[test]
fn read_failure_is_wrapped() {
    let expectations: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        .chain([
            Transaction::read(address::DATA_MSB, vec![0x00]).with_error(ErrorKind::Other)
        ])
        .collect();
    let mut bus = I2cMock::new(&expectations);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();
    assert_eq!(
        block_on(sensor.read(&mut RecordingDelay::default())),
        Err(SensorError::Read(ErrorKind::Other))
    );
    bus.done();
}

#[test]
fn failed_write_keeps_confirmed_register() {
    let expectations: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        .chain([
            Transaction::read(address::AR, vec![0x00]),
            Transaction::write(address::CMD, vec![0b0000_1010]).with_error(ErrorKind::Other),
        ])
        .collect();
    let mut bus = I2cMock::new(&expectations);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();
    assert_eq!(
        block_on(sensor.set_integration_time(IntegrationTime::TwoT)),
        Err(SensorError::Write(ErrorKind::Other))
    );

    assert_eq!(sensor.integration_time(), IntegrationTime::OneT);
    assert_eq!(sensor.command_register().to_byte(), ACTIVE_1T);
    assert_eq!(sensor.config().integration_time, IntegrationTime::OneT);
    bus.done();
}

#[test]
fn setters_require_enabled_sensor() {
    let mut sensor = Veml6070::new(MockProvider::default(), Default::default());

    assert!(matches!(
        block_on(sensor.set_acknowledge_mode(AcknowledgeMode::Enabled)),
        Err(SensorError::InvalidState { .. })
    ));
    assert!(matches!(
        block_on(sensor.set_integration_time(IntegrationTime::HalfT)),
        Err(SensorError::InvalidState { .. })
    ));
    assert_eq!(sensor.integration_time(), IntegrationTime::OneT);
    assert!(sensor.release().opened.is_empty());
}

#[test]
fn raw_field_codes_are_validated_before_any_io() {
    let expectations: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        // reserved | IT = 1T | ACK_THD
        .chain(commit(0b0001_0110))
        .collect();
    let mut bus = I2cMock::new(&expectations);
    let mut sensor = Veml6070::new(MockProvider::with_buses(&[&bus]), Default::default());

    block_on(sensor.enable()).unwrap();

    assert_eq!(
        block_on(sensor.set_field(CommandField::IntegrationTime, 99)),
        Err(SensorError::Register(CommandRegisterError {
            field: CommandField::IntegrationTime,
            value: 99
        }))
    );
    assert!(matches!(
        block_on(sensor.set_field(CommandField::ShutdownMode, 1)),
        Err(SensorError::Register(_))
    ));
    block_on(sensor.set_field(CommandField::AcknowledgeThreshold, 1)).unwrap();

    assert_eq!(sensor.command_register().to_byte(), 0b0001_0110);
    bus.done();
}

#[test]
fn close_failure_still_disables() {
    let first: Vec<_> = commit(ACTIVE_1T)
        .into_iter()
        .chain(commit(SHUTDOWN_1T))
        .collect();
    let mut bus = I2cMock::new(&first);
    let mut provider = MockProvider::with_buses(&[&bus]);
    provider.close_error = Some(ErrorKind::Bus);
    let mut sensor = Veml6070::new(provider, Default::default());

    block_on(sensor.enable()).unwrap();
    assert_eq!(
        block_on(sensor.disable()),
        Err(SensorError::Close(ErrorKind::Bus))
    );
    assert_eq!(sensor.state(), SensorState::Disabled);
    assert_eq!(sensor.bus_state(), BusState::Closed);
    bus.done();
}
