//! # homemeter-rs - Decoders for Home Utility Meters
//!
//! The homemeter-rs crate turns the raw signals of three common home metering
//! inputs into measurements:
//!
//! - **DHT22** humidity/temperature sensor: the 40-bit frame is rebuilt from
//!   microsecond edge timings on a GPIO pin.
//! - **Water meter** with a pulse output: debounced rising edges, one litre
//!   each.
//! - **DSMR P1** smart meter port: line-oriented telegrams, framed by `/` and
//!   `!`, protected by a CRC-16.
//!
//! Every decoder is a plain state machine fed one event (edge or line) at a
//! time. The `session` module wires a decoder to its input and a
//! [`MeasurementSink`] and runs it on tokio.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! homemeter-rs = "0.3.0"
//! ```
//!
//! ```rust
//! use homemeter_rs::p1::{FrameOutcome, TelegramFrameAssembler};
//!
//! let mut assembler = TelegramFrameAssembler::new();
//! let outcomes = assembler.push_bytes(
//!     b"/ISK5\\2M550T-1012\r\n1-0:1.8.1(12345.678*kWh)\r\n1-0:1.7.0(0.500*kWh)\r\n0-0:96.14.0(0002)\r\n!13A9\r\n",
//! );
//! assert!(matches!(&outcomes[0], FrameOutcome::Packet(p) if p.low_consumed_wh == 12_345_678));
//! ```
//!
//! GPIO access on a Raspberry Pi needs the `raspberry-pi` feature.

pub mod config;
pub mod constants;
pub mod error;
pub mod gpio;
pub mod logging;
pub mod p1;
pub mod session;
pub mod sink;
pub mod stats;
pub mod util;

pub use crate::error::MeterError;
pub use crate::logging::{init_logger, log_info};

pub use config::{Dht22Config, P1Config, WatermeterConfig};
pub use gpio::{
    ChannelEdgeSource, DecodedReading, EdgeConsumer, EdgeEvent, EdgeKind, EdgeSource,
    EdgeTimingDecoder, PulseCounter,
};
pub use p1::{decode_capture, FrameOutcome, TelegramFrameAssembler, TelegramPacket};
pub use session::{run_edge_session, run_telegram_session};
pub use sink::{FieldValue, Measurement, MeasurementSink, MemorySink, OutputFormat, WriterSink};
pub use stats::DecoderStats;
pub use util::tick::interval;

#[cfg(feature = "raspberry-pi")]
pub use gpio::RppalEdgeSource;

/// Open the P1 serial port and decode telegrams into `sink` until shutdown.
///
/// A port that reaches end of stream ends the session with `StreamClosed`.
pub async fn read_p1<K: MeasurementSink + ?Sized>(
    config: &P1Config,
    sink: &mut K,
    shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<DecoderStats, MeterError> {
    let port = p1::serial::open_port(config)?;
    let mut assembler = TelegramFrameAssembler::new();
    run_telegram_session(port, &mut assembler, sink, shutdown).await
}

/// Watch the DHT22 data pin and report readings into `sink`.
#[cfg(feature = "raspberry-pi")]
pub async fn read_dht22<K: MeasurementSink + ?Sized>(
    config: &Dht22Config,
    sink: &mut K,
    shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<DecoderStats, MeterError> {
    config.validate()?;
    let source = RppalEdgeSource::open(config.pin, EdgeKind::Rising, false)?;
    run_edge_session(
        source,
        EdgeTimingDecoder::new(),
        sink,
        shutdown,
        Some(config.poll_interval),
    )
    .await
}

/// Count water meter pulses into `sink`.
#[cfg(feature = "raspberry-pi")]
pub async fn read_watermeter<K: MeasurementSink + ?Sized>(
    config: &WatermeterConfig,
    sink: &mut K,
    shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<DecoderStats, MeterError> {
    config.validate()?;
    let source = RppalEdgeSource::open(config.pin, EdgeKind::Either, true)?;
    run_edge_session(source, PulseCounter::new(), sink, shutdown, None).await
}
