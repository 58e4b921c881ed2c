//! Bit-level model of the VEML6070 command register.
//!
//! The device has a single write-only command byte. Its layout (datasheet,
//! pages 6 to 8) is:
//!
//! | Bit | Field   | Meaning                                  |
//! |-----|---------|------------------------------------------|
//! | 0   | SD      | Shutdown mode                            |
//! | 1   | -       | Reserved, must be 1                      |
//! | 2   | IT_0    | Integration time, low bit                |
//! | 3   | IT_1    | Integration time, high bit               |
//! | 4   | ACK_THD | Acknowledge threshold window             |
//! | 5   | ACK     | Acknowledge activity                     |
//! | 6-7 | -       | Reserved                                 |

use crate::error::{CommandRegisterError, LogicError};
use crate::settings::{AcknowledgeMode, AcknowledgeThreshold, IntegrationTime, ShutdownMode};

/// Bit positions within the command byte.
mod bits {
    pub const SD: u8 = 0;
    pub const RESERVED: u8 = 1;
    pub const IT_0: u8 = 2;
    pub const IT_1: u8 = 3;
    pub const ACK_THD: u8 = 4;
    pub const ACK: u8 = 5;
}

/// Number of addressable bits in a register.
pub const BIT_COUNT: u8 = 8;

/// A single byte with individually addressable bits.
///
/// Bits are indexed from 0 (least significant) to 7 (most significant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitRegister(u8);

impl BitRegister {
    /// Creates a register holding the raw byte `value`.
    pub fn from_hex(value: u8) -> Self {
        BitRegister(value)
    }

    /// Creates a register from eight bit values, index 0 first.
    pub fn from_bits(bits: [u8; 8]) -> Result<Self, LogicError> {
        let mut register = BitRegister::default();
        register.write_bits(bits.map(Some))?;
        Ok(register)
    }

    /// Returns the raw byte.
    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Reads the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index` is greater than 7.
    pub fn read_bit(&self, index: u8) -> u8 {
        assert!(index < BIT_COUNT, "bit index out of range");
        (self.0 >> index) & 1
    }

    /// Reads all eight bits, index 0 first.
    pub fn read_bits(&self) -> [u8; 8] {
        core::array::from_fn(|i| self.read_bit(i as u8))
    }

    /// Writes `value` (0 or 1) to the bit at `index`.
    ///
    /// # Errors
    /// Returns [`LogicError`] for an index outside `0..=7` or a value other
    /// than 0 or 1. The register is untouched in that case.
    pub fn write_bit(&mut self, index: u8, value: u8) -> Result<(), LogicError> {
        Self::check(index, value)?;
        self.set_bit(index, value == 1);
        Ok(())
    }

    /// Writes several bits at once. `None` entries leave the bit untouched.
    ///
    /// All entries are validated before any bit is written, so either every
    /// supplied bit is applied or none is.
    pub fn write_bits(&mut self, bits: [Option<u8>; 8]) -> Result<(), LogicError> {
        for (index, value) in bits.iter().enumerate() {
            if let Some(value) = value {
                Self::check(index as u8, *value)?;
            }
        }

        for (index, value) in bits.iter().enumerate() {
            if let Some(value) = value {
                self.set_bit(index as u8, *value == 1);
            }
        }

        Ok(())
    }

    fn check(index: u8, value: u8) -> Result<(), LogicError> {
        if index >= BIT_COUNT {
            return Err(LogicError::InvalidBitIndex(index));
        }
        if value > 1 {
            return Err(LogicError::InvalidBitValue { index, value });
        }
        Ok(())
    }

    /// Unchecked write used by the named field accessors.
    fn set_bit(&mut self, index: u8, on: bool) {
        debug_assert!(index < BIT_COUNT);
        if on {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }
}

/// Named fields of the command register, used to report decoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandField {
    ShutdownMode,
    IntegrationTime,
    AcknowledgeThreshold,
    AcknowledgeMode,
    Reserved,
}

impl CommandField {
    pub fn name(self) -> &'static str {
        match self {
            CommandField::ShutdownMode => "shutdown mode",
            CommandField::IntegrationTime => "integration time",
            CommandField::AcknowledgeThreshold => "acknowledge threshold",
            CommandField::AcknowledgeMode => "acknowledge mode",
            CommandField::Reserved => "reserved bit",
        }
    }
}

/// The VEML6070 command register.
///
/// `Default` yields the datasheet power-on value: sensor active, reserved bit
/// set, integration time 1T (`0x06`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRegister(BitRegister);

impl Default for CommandRegister {
    fn default() -> Self {
        let mut register = BitRegister::default();
        register.set_bit(bits::RESERVED, true);
        register.set_bit(bits::IT_0, true);
        CommandRegister(register)
    }
}

impl CommandRegister {
    /// Decodes a raw command byte.
    ///
    /// # Errors
    /// Fails if the reserved bit 1 is not set.
    pub fn from_byte(value: u8) -> Result<Self, CommandRegisterError> {
        let register = BitRegister::from_hex(value);
        if register.read_bit(bits::RESERVED) != 1 {
            return Err(CommandRegisterError {
                field: CommandField::Reserved,
                value,
            });
        }
        Ok(CommandRegister(register))
    }

    /// Returns the raw byte written to the device.
    pub fn to_byte(self) -> u8 {
        self.0.to_byte()
    }

    /// Returns the underlying bit register.
    pub fn bits(&self) -> BitRegister {
        self.0
    }

    pub fn shutdown_mode(&self) -> ShutdownMode {
        match self.0.read_bit(bits::SD) {
            0 => ShutdownMode::Disabled,
            _ => ShutdownMode::Enabled,
        }
    }

    pub fn set_shutdown_mode(&mut self, mode: ShutdownMode) {
        self.0.set_bit(bits::SD, mode == ShutdownMode::Enabled);
    }

    pub fn integration_time(&self) -> IntegrationTime {
        let code = (self.0.read_bit(bits::IT_1) << 1) | self.0.read_bit(bits::IT_0);
        IntegrationTime::from_bits(code)
    }

    pub fn set_integration_time(&mut self, it: IntegrationTime) {
        let code = it as u8;
        self.0.set_bit(bits::IT_0, code & 0b01 != 0);
        self.0.set_bit(bits::IT_1, code & 0b10 != 0);
    }

    pub fn acknowledge_mode(&self) -> AcknowledgeMode {
        match self.0.read_bit(bits::ACK) {
            0 => AcknowledgeMode::Disabled,
            _ => AcknowledgeMode::Enabled,
        }
    }

    pub fn set_acknowledge_mode(&mut self, mode: AcknowledgeMode) {
        self.0.set_bit(bits::ACK, mode == AcknowledgeMode::Enabled);
    }

    pub fn acknowledge_threshold(&self) -> AcknowledgeThreshold {
        match self.0.read_bit(bits::ACK_THD) {
            0 => AcknowledgeThreshold::Steps102,
            _ => AcknowledgeThreshold::Steps145,
        }
    }

    pub fn set_acknowledge_threshold(&mut self, threshold: AcknowledgeThreshold) {
        self.0.set_bit(bits::ACK_THD, threshold == AcknowledgeThreshold::Steps145);
    }

    /// Sets a field from its raw code.
    ///
    /// # Errors
    /// Returns [`CommandRegisterError`] naming the field and the code if the
    /// code is not valid for that field. The register is left unchanged.
    pub fn set_field(&mut self, field: CommandField, code: u8) -> Result<(), CommandRegisterError> {
        match field {
            CommandField::ShutdownMode => self.set_shutdown_mode(code.try_into()?),
            CommandField::IntegrationTime => self.set_integration_time(code.try_into()?),
            CommandField::AcknowledgeThreshold => {
                self.set_acknowledge_threshold(code.try_into()?)
            }
            CommandField::AcknowledgeMode => self.set_acknowledge_mode(code.try_into()?),
            CommandField::Reserved => {
                return Err(CommandRegisterError { field, value: code });
            }
        }
        Ok(())
    }
}
