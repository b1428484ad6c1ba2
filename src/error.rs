//! # Error Handling
//!
//! This module defines the `MeterError` enum, which represents the different
//! error types that can occur while reading and decoding meter signals.

use thiserror::Error;

/// Represents the different error types that can occur in the crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeterError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates an error reported by the GPIO backend.
    #[error("GPIO error: {0}")]
    GpioError(String),

    /// The CRC transmitted after `!` does not match the frame contents.
    #[error("invalid checksum, given {given:x} but computed {computed:x}")]
    ChecksumMismatch { given: u16, computed: u16 },

    /// The characters after `!` are not a 16-bit hexadecimal number.
    #[error("malformed checksum '{0}'")]
    MalformedChecksum(String),

    /// The tariff indicator is not an integer.
    #[error("could not parse tariff ('{0}')")]
    InvalidTariff(String),

    /// An energy register value is not a number.
    #[error("error parsing kWh figure, '{0}'")]
    InvalidKwh(String),

    /// A gas register value is not a number.
    #[error("error parsing m3 figure, '{0}'")]
    InvalidCubicMeters(String),

    /// A line exceeded the maximum buffered length and was dropped.
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The upstream producer of events or bytes went away.
    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A catch-all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl MeterError {
    /// Returns `true` for errors that only invalidate the current frame.
    ///
    /// Everything else ends the session and is propagated to the host.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            MeterError::ChecksumMismatch { .. }
                | MeterError::MalformedChecksum(_)
                | MeterError::InvalidTariff(_)
                | MeterError::InvalidKwh(_)
                | MeterError::InvalidCubicMeters(_)
                | MeterError::LineTooLong(_)
        )
    }
}

impl From<std::io::Error> for MeterError {
    fn from(e: std::io::Error) -> Self {
        MeterError::SerialPortError(e.to_string())
    }
}

impl From<tokio_serial::Error> for MeterError {
    fn from(e: tokio_serial::Error) -> Self {
        MeterError::SerialPortError(e.to_string())
    }
}
