//! Error types for the VEML6070 driver.

use core::fmt;

use crate::register::CommandField;
use crate::SensorState;

/// Invalid bit access on a [`BitRegister`](crate::register::BitRegister).
///
/// These indicate a programming error rather than a device fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogicError {
    /// Bit index outside `0..=7`.
    InvalidBitIndex(u8),
    /// Bit value other than `0` or `1`.
    InvalidBitValue { index: u8, value: u8 },
}

impl fmt::Display for LogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicError::InvalidBitIndex(index) => {
                write!(f, "invalid bit index {index}, expected a value from 0 to 7")
            }
            LogicError::InvalidBitValue { index, value } => {
                write!(f, "invalid value {value} for bit {index}, expected 0 or 1")
            }
        }
    }
}

impl core::error::Error for LogicError {}

/// A raw code that does not decode to a valid value of a command register field.
///
/// The register is never modified when this error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRegisterError {
    /// The field the code was meant for.
    pub field: CommandField,
    /// The rejected code.
    pub value: u8,
}

impl fmt::Display for CommandRegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} code {}", self.field.name(), self.value)
    }
}

impl core::error::Error for CommandRegisterError {}

/// Errors returned by the sensor lifecycle.
///
/// `E` is the error type of the I2C bus. Bus failures are always wrapped into
/// the variant naming the step that failed, keeping the original cause.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// The operation is not allowed in the current sensor state.
    InvalidState {
        expected: SensorState,
        actual: SensorState,
    },
    /// Opening the bus failed.
    Open(E),
    /// Reading the Alert-Response address to clear the ACK state failed.
    ClearAck(E),
    /// Writing the command register failed.
    Write(E),
    /// Reading a data byte failed.
    Read(E),
    /// Closing the bus failed.
    Close(E),
    /// A raw code could not be decoded into a register field.
    Register(CommandRegisterError),
}

impl<E> From<CommandRegisterError> for SensorError<E> {
    fn from(e: CommandRegisterError) -> Self {
        SensorError::Register(e)
    }
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::InvalidState { expected, actual } => write!(
                f,
                "invalid state: sensor is {actual:?}, operation requires {expected:?}"
            ),
            SensorError::Open(e) => write!(f, "failed to open the I2C bus: {e:?}"),
            SensorError::ClearAck(e) => write!(f, "failed to clear the ACK state: {e:?}"),
            SensorError::Write(e) => write!(f, "failed to write the command register: {e:?}"),
            SensorError::Read(e) => write!(f, "failed to read sensor data: {e:?}"),
            SensorError::Close(e) => write!(f, "failed to close the I2C bus: {e:?}"),
            SensorError::Register(e) => write!(f, "{e}"),
        }
    }
}

impl<E> core::error::Error for SensorError<E>
where
    E: core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            SensorError::InvalidState { .. } => None,
            SensorError::Open(e)
            | SensorError::ClearAck(e)
            | SensorError::Write(e)
            | SensorError::Read(e)
            | SensorError::Close(e) => Some(e),
            SensorError::Register(e) => Some(e),
        }
    }
}

/// Result type alias for sensor operations.
pub type Result<T, E> = core::result::Result<T, SensorError<E>>;
