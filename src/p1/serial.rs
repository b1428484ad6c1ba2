//! # P1 Serial Transport
//!
//! Opens the P1 port with `tokio-serial`. DSMR 4 and later use 115200 baud,
//! 8 data bits, no parity, one stop bit; the line is receive-only.

use crate::config::P1Config;
use crate::error::MeterError;
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Opens the serial port described by `config`.
pub fn open_port(config: &P1Config) -> Result<SerialStream, MeterError> {
    config.validate()?;

    let port = tokio_serial::new(&config.port, config.baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::None)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(Duration::from_secs(5))
        .open_native_async()
        .map_err(|e| {
            MeterError::SerialPortError(format!("could not open {}: {e}", config.port))
        })?;

    log::info!("Opened P1 port {} at {} baud", config.port, config.baud);
    Ok(port)
}
