#![cfg_attr(not(test), no_std)]

//! # VEML6070 UV-Light Sensor Driver
//!
//! An async, `no_std` driver for the Vishay VEML6070.
//! The sensor is controlled through a single write-only command byte and
//! reports its reading as two bytes at separate I2C addresses.
//!
//! ## Features
//! - **Bit-exact Command Register**: Every field of the command byte is
//!   modelled with a typed accessor, invalid codes are rejected at decode time.
//! - **Lifecycle Management**: The bus is acquired on `enable` and released on
//!   `disable`, so a shut-down sensor holds no bus.
//! - **Staged Commits**: Configuration changes are written to a copy of the
//!   register first. The driver's view only changes once the bus confirmed the write.
//! - **UV Index Classification**: Readings are normalized to 1T and mapped to
//!   the WHO exposure risk levels.
//!
//! ## Units
//! - **Raw value**: Counts, MSB:LSB of the two data bytes.
//! - **Normalized value**: Counts at 1T integration time.
//! - **Refresh time**: Milliseconds (`112.5` at 1T with a 270 kΩ RSET).

mod fmt;

pub mod bus;
pub mod calc;
pub mod error;
pub mod register;
pub mod settings;

pub use bus::{BusError, BusProvider};
pub use error::{CommandRegisterError, LogicError, SensorError};
pub use register::{BitRegister, CommandField, CommandRegister};
pub use settings::{
    AcknowledgeMode, AcknowledgeThreshold, Config, IntegrationTime, KiloOhms, ShutdownMode,
    Veml6070Builder,
};

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

/// Fixed 7-bit I2C addresses used by the VEML6070.
///
/// The device occupies several addresses instead of exposing registers behind
/// one address.
pub mod address {
    /// Alert Response. Reading it clears the ACK state.
    pub const AR: u8 = 0x0C;
    /// Command register (write).
    pub const CMD: u8 = 0x38;
    /// Data MSB (read).
    pub const DATA_MSB: u8 = 0x39;
    /// Data LSB (read).
    pub const DATA_LSB: u8 = 0x33;
}

/// Power state of the sensor as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorState {
    /// In shutdown, no bus held.
    Disabled,
    /// Active and measuring, bus open.
    Enabled,
}

/// Whether the driver currently holds an open bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    Closed,
    Open,
}

/// Exposure risk of a UV index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RiskLevel {
    /// UV index 0 to 2.
    Low,
    /// UV index 3 to 5.
    Moderate,
    /// UV index 6 to 7.
    High,
    /// UV index 8 to 10.
    VeryHigh,
    /// UV index 11 and above.
    Extreme,
}

/// UV index wrapper for type-safety.
///
/// # Example
/// ```rust
/// use veml6070_driver::{RiskLevel, UvIndex};
/// assert_eq!(UvIndex(4).risk_level(), RiskLevel::Moderate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UvIndex(pub u16);

impl UvIndex {
    pub fn risk_level(self) -> RiskLevel {
        calc::risk_level(self)
    }
}

/// A single reading.
///
/// Created fresh by every [`Veml6070::read`] and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorValue {
    raw_value: u16,
    normalized_value: f32,
    uv_index: UvIndex,
    risk_level: RiskLevel,
}

impl SensorValue {
    pub(crate) fn new(
        raw_value: u16,
        normalized_value: f32,
        uv_index: UvIndex,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            raw_value,
            normalized_value,
            uv_index,
            risk_level,
        }
    }

    /// Raw counts as read from the device.
    pub fn raw_value(&self) -> u16 {
        self.raw_value
    }

    /// Raw counts divided by the integration time multiplier.
    pub fn normalized_value(&self) -> f32 {
        self.normalized_value
    }

    pub fn uv_index(&self) -> UvIndex {
        self.uv_index
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// The main VEML6070 driver structure.
///
/// Use [`Veml6070::new`] followed by [`Veml6070::enable`], or
/// [`Veml6070::initialize`] to do both at once. All operations take
/// `&mut self`, so calls on one instance are always serialized.
pub struct Veml6070<P: BusProvider> {
    provider: P,
    bus: Option<P::Bus>,
    /// The register as last confirmed by the device.
    command: CommandRegister,
    state: SensorState,
    config: Config,
}

impl<P: BusProvider> Veml6070<P> {
    /// Creates a new driver instance in the `Disabled` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(provider: P, config: Config) -> Self {
        Veml6070 {
            provider,
            bus: None,
            command: CommandRegister::default(),
            state: SensorState::Disabled,
            config,
        }
    }

    /// Creates a driver and enables the sensor.
    pub async fn initialize(provider: P, config: Config) -> error::Result<Self, BusError<P>> {
        let mut sensor = Self::new(provider, config);
        sensor.enable().await?;
        Ok(sensor)
    }

    /// Consumes the driver and returns the bus provider.
    ///
    /// Disable the sensor first; a bus that is still open is dropped without
    /// being closed.
    pub fn release(self) -> P {
        self.provider
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn bus_state(&self) -> BusState {
        if self.bus.is_some() {
            BusState::Open
        } else {
            BusState::Closed
        }
    }

    /// The current configuration, kept in sync with committed register changes.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A copy of the register as last confirmed by the device.
    pub fn command_register(&self) -> CommandRegister {
        self.command
    }

    pub fn shutdown_mode(&self) -> ShutdownMode {
        self.command.shutdown_mode()
    }

    pub fn integration_time(&self) -> IntegrationTime {
        self.command.integration_time()
    }

    pub fn acknowledge_mode(&self) -> AcknowledgeMode {
        self.command.acknowledge_mode()
    }

    pub fn acknowledge_threshold(&self) -> AcknowledgeThreshold {
        self.command.acknowledge_threshold()
    }

    /// Time [`read`](Self::read) waits before fetching data, in milliseconds.
    pub fn refresh_time_ms(&self) -> f32 {
        calc::refresh_time_ms(self.config.r_set, self.command.integration_time())
    }

    /// Opens the bus and takes the sensor out of shutdown.
    ///
    /// The integration time and acknowledge settings from the [`Config`] are
    /// committed in the same write. If that write fails the bus is closed
    /// again and the sensor stays `Disabled`.
    pub async fn enable(&mut self) -> error::Result<(), BusError<P>> {
        self.ensure_state(SensorState::Disabled)?;

        let bus = self
            .provider
            .open(self.config.bus_number)
            .await
            .map_err(SensorError::Open)?;
        self.bus = Some(bus);
        debug!("bus {} opened", self.config.bus_number);

        let mut staged = self.command;
        staged.set_integration_time(self.config.integration_time);
        staged.set_acknowledge_mode(self.config.acknowledge_mode);
        staged.set_acknowledge_threshold(self.config.acknowledge_threshold);
        staged.set_shutdown_mode(ShutdownMode::Disabled);

        if let Err(e) = self.commit(staged).await {
            if let Some(bus) = self.bus.take() {
                if self.provider.close(bus).await.is_err() {
                    warn!("failed to close bus after aborted enable");
                }
            }
            return Err(e);
        }

        self.state = SensorState::Enabled;
        debug!("sensor enabled");
        Ok(())
    }

    /// Puts the sensor into shutdown and closes the bus.
    ///
    /// If closing fails the sensor is still reported `Disabled`: the device
    /// is already in shutdown and the bus handle has been given up.
    pub async fn disable(&mut self) -> error::Result<(), BusError<P>> {
        self.ensure_state(SensorState::Enabled)?;

        let mut staged = self.command;
        staged.set_shutdown_mode(ShutdownMode::Enabled);
        self.commit(staged).await?;

        self.state = SensorState::Disabled;
        debug!("sensor disabled");

        if let Some(bus) = self.bus.take() {
            self.provider.close(bus).await.map_err(SensorError::Close)?;
            debug!("bus {} closed", self.config.bus_number);
        }
        Ok(())
    }

    /// Waits for the refresh time and reads one measurement.
    ///
    /// The wait depends on the active integration time and RSET, see
    /// [`refresh_time_ms`](Self::refresh_time_ms).
    pub async fn read(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> error::Result<SensorValue, BusError<P>> {
        self.ensure_state(SensorState::Enabled)?;

        let it = self.command.integration_time();
        let wait_us = calc::refresh_time_us(self.config.r_set, it);
        trace!("waiting {} us for refresh", wait_us);
        delay.delay_us(wait_us).await;

        let bus = self.open_bus()?;
        let msb = read_byte(bus, address::DATA_MSB)
            .await
            .map_err(SensorError::Read)?;
        let lsb = read_byte(bus, address::DATA_LSB)
            .await
            .map_err(SensorError::Read)?;

        let raw = u16::from_be_bytes([msb, lsb]);
        trace!("raw reading {}", raw);

        Ok(calc::sensor_value(raw, it, self.config.r_set))
    }

    /// Changes the integration time of the running sensor.
    pub async fn set_integration_time(
        &mut self,
        it: IntegrationTime,
    ) -> error::Result<(), BusError<P>> {
        self.update(|reg| reg.set_integration_time(it)).await
    }

    pub async fn set_acknowledge_mode(
        &mut self,
        mode: AcknowledgeMode,
    ) -> error::Result<(), BusError<P>> {
        self.update(|reg| reg.set_acknowledge_mode(mode)).await
    }

    pub async fn set_acknowledge_threshold(
        &mut self,
        threshold: AcknowledgeThreshold,
    ) -> error::Result<(), BusError<P>> {
        self.update(|reg| reg.set_acknowledge_threshold(threshold)).await
    }

    /// Sets a register field from its raw code, e.g. one parsed from a
    /// configuration source.
    ///
    /// The shutdown bit belongs to [`enable`](Self::enable) and
    /// [`disable`](Self::disable) and is rejected here.
    pub async fn set_field(
        &mut self,
        field: CommandField,
        code: u8,
    ) -> error::Result<(), BusError<P>> {
        self.ensure_state(SensorState::Enabled)?;

        if field == CommandField::ShutdownMode {
            return Err(CommandRegisterError { field, value: code }.into());
        }

        let mut staged = self.command;
        staged.set_field(field, code)?;
        self.commit(staged).await?;
        self.sync_config();
        Ok(())
    }

    async fn update(
        &mut self,
        change: impl FnOnce(&mut CommandRegister),
    ) -> error::Result<(), BusError<P>> {
        self.ensure_state(SensorState::Enabled)?;

        let mut staged = self.command;
        change(&mut staged);
        self.commit(staged).await?;
        self.sync_config();
        Ok(())
    }

    /// Clears the ACK state and writes `staged` to the device.
    ///
    /// `self.command` is replaced only after the bus accepted the write.
    async fn commit(&mut self, staged: CommandRegister) -> error::Result<(), BusError<P>> {
        let ignore_ack_error = self.config.ignore_ack_error;
        let bus = self.open_bus()?;

        // The VEML6070 never returns a meaningful byte here, the read only
        // releases a pending acknowledge.
        if let Err(e) = read_byte(bus, address::AR).await {
            if !ignore_ack_error {
                return Err(SensorError::ClearAck(e));
            }
            warn!("ignoring failed ACK clear");
        }

        bus.write(address::CMD, &[staged.to_byte()])
            .await
            .map_err(SensorError::Write)?;
        trace!("command register {=u8:#x} written", staged.to_byte());

        self.command = staged;
        Ok(())
    }

    /// Mirrors the committed register settings into the configuration, so a
    /// later `enable` restores them.
    fn sync_config(&mut self) {
        self.config.integration_time = self.command.integration_time();
        self.config.acknowledge_mode = self.command.acknowledge_mode();
        self.config.acknowledge_threshold = self.command.acknowledge_threshold();
    }

    fn ensure_state(&self, expected: SensorState) -> error::Result<(), BusError<P>> {
        if self.state != expected {
            return Err(SensorError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn open_bus(&mut self) -> error::Result<&mut P::Bus, BusError<P>> {
        match self.bus.as_mut() {
            Some(bus) => Ok(bus),
            None => Err(SensorError::InvalidState {
                expected: SensorState::Enabled,
                actual: self.state,
            }),
        }
    }
}

/// Reads a single byte from a device address.
async fn read_byte<B: I2c>(bus: &mut B, address: u8) -> Result<u8, B::Error> {
    let mut buffer = [0u8];
    bus.read(address, &mut buffer).await?;
    Ok(buffer[0])
}
