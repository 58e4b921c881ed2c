use crate::error::CommandRegisterError;
use crate::register::CommandField;

/// Resistor value wrapper for type-safety. Stored in kΩ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KiloOhms(pub u16);

impl Default for KiloOhms {
    /// The 270 kΩ RSET of the reference design.
    fn default() -> Self {
        KiloOhms(270)
    }
}

/// Shutdown mode setting (SD, bit 0 of the command register).
///
/// Note the inverted naming of the datasheet: a *disabled* shutdown mode means
/// the sensor is active and measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ShutdownMode {
    /// Shutdown disabled, the sensor is active.
    #[default]
    Disabled = 0,
    /// Shutdown enabled. Reduces power consumption to less than 1 µA.
    Enabled = 1,
}

/// Integration time setting (IT_1:IT_0, bits 3:2 of the command register).
///
/// Longer integration times accumulate more light per sample and scale the
/// raw reading accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IntegrationTime {
    /// ½T.
    HalfT = 0b00,
    /// 1T (power-on default).
    #[default]
    OneT = 0b01,
    /// 2T.
    TwoT = 0b10,
    /// 4T.
    FourT = 0b11,
}

impl IntegrationTime {
    /// Decodes the 2-bit field.
    ///
    /// Every 2-bit pattern is a valid code, the mask only guards the upper
    /// bits. Anything unexpected falls back to 1T.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => IntegrationTime::HalfT,
            0b10 => IntegrationTime::TwoT,
            0b11 => IntegrationTime::FourT,
            _ => IntegrationTime::OneT,
        }
    }

    /// Multiplier relative to 1T.
    pub fn multiplier(self) -> f32 {
        match self {
            IntegrationTime::HalfT => 0.5,
            IntegrationTime::OneT => 1.0,
            IntegrationTime::TwoT => 2.0,
            IntegrationTime::FourT => 4.0,
        }
    }
}

/// Acknowledge activity setting (ACK, bit 5 of the command register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AcknowledgeMode {
    #[default]
    Disabled = 0,
    Enabled = 1,
}

/// Acknowledge threshold window (ACK_THD, bit 4 of the command register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AcknowledgeThreshold {
    /// 102 steps.
    #[default]
    Steps102 = 0,
    /// 145 steps.
    Steps145 = 1,
}

impl TryFrom<u8> for ShutdownMode {
    type Error = CommandRegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ShutdownMode::Disabled),
            1 => Ok(ShutdownMode::Enabled),
            _ => Err(CommandRegisterError {
                field: CommandField::ShutdownMode,
                value,
            }),
        }
    }
}

impl TryFrom<u8> for IntegrationTime {
    type Error = CommandRegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=3 => Ok(IntegrationTime::from_bits(value)),
            _ => Err(CommandRegisterError {
                field: CommandField::IntegrationTime,
                value,
            }),
        }
    }
}

impl TryFrom<u8> for AcknowledgeMode {
    type Error = CommandRegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AcknowledgeMode::Disabled),
            1 => Ok(AcknowledgeMode::Enabled),
            _ => Err(CommandRegisterError {
                field: CommandField::AcknowledgeMode,
                value,
            }),
        }
    }
}

impl TryFrom<u8> for AcknowledgeThreshold {
    type Error = CommandRegisterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AcknowledgeThreshold::Steps102),
            1 => Ok(AcknowledgeThreshold::Steps145),
            _ => Err(CommandRegisterError {
                field: CommandField::AcknowledgeThreshold,
                value,
            }),
        }
    }
}

/// Complete sensor configuration.
///
/// The register settings are staged together with the shutdown bit when the
/// sensor is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Number of the I2C bus/adapter the sensor is wired to.
    pub bus_number: u8,
    /// RSET resistor fitted on the board.
    pub r_set: KiloOhms,
    /// Integration time applied on enable.
    pub integration_time: IntegrationTime,
    /// Acknowledge activity applied on enable.
    pub acknowledge_mode: AcknowledgeMode,
    /// Acknowledge threshold applied on enable.
    pub acknowledge_threshold: AcknowledgeThreshold,
    /// Swallow failures of the Alert-Response read that clears the ACK state.
    ///
    /// The VEML6070 never answers that read meaningfully, so this defaults to `true`.
    pub ignore_ack_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_number: 1,
            r_set: KiloOhms::default(),
            integration_time: IntegrationTime::default(),
            acknowledge_mode: AcknowledgeMode::default(),
            acknowledge_threshold: AcknowledgeThreshold::default(),
            ignore_ack_error: true,
        }
    }
}

/// Builder for a [`Config`].
#[derive(Default)]
pub struct Veml6070Builder {
    config: Config,
}

impl Veml6070Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the I2C bus number.
    pub fn bus_number(mut self, bus_number: u8) -> Self {
        self.config.bus_number = bus_number;
        self
    }

    /// Sets the RSET value.
    pub fn r_set(mut self, r_set: KiloOhms) -> Self {
        self.config.r_set = r_set;
        self
    }

    pub fn integration_time(mut self, it: IntegrationTime) -> Self {
        self.config.integration_time = it;
        self
    }

    pub fn acknowledge_mode(mut self, mode: AcknowledgeMode) -> Self {
        self.config.acknowledge_mode = mode;
        self
    }

    pub fn acknowledge_threshold(mut self, threshold: AcknowledgeThreshold) -> Self {
        self.config.acknowledge_threshold = threshold;
        self
    }

    /// Controls whether a failed clear-ACK read is reported as an error.
    pub fn ignore_ack_error(mut self, ignore: bool) -> Self {
        self.config.ignore_ack_error = ignore;
        self
    }

    /// Finalizes the builder and returns the `Config`.
    pub fn build(self) -> Config {
        self.config
    }
}
