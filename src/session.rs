//! # Input Sessions
//!
//! A session binds one input to one decoder and one sink and runs until the
//! shutdown signal fires or the input goes away. Each session processes its
//! events strictly in order on a single task; sessions for different inputs
//! share nothing and can run side by side.
//!
//! ```rust,no_run
//! use homemeter_rs::gpio::{ChannelEdgeSource, PulseCounter};
//! use homemeter_rs::session::run_edge_session;
//! use homemeter_rs::sink::MemorySink;
//! use tokio::sync::watch;
//!
//! # async fn demo() -> Result<(), homemeter_rs::MeterError> {
//! let (_tx, source) = ChannelEdgeSource::channel();
//! let (_stop, shutdown) = watch::channel(false);
//! let mut sink = MemorySink::new();
//! let stats = run_edge_session(source, PulseCounter::new(), &mut sink, shutdown, None).await?;
//! println!("{} pulses", stats.frames_ok);
//! # Ok(())
//! # }
//! ```

use crate::error::MeterError;
use crate::gpio::{EdgeConsumer, EdgeSource};
use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::p1::{FrameOutcome, TelegramFrameAssembler};
use crate::sink::MeasurementSink;
use crate::stats::DecoderStats;
use crate::util::logging::LogThrottle;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

const READ_CHUNK: usize = 1024;

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender dropped without signalling; keep running.
            std::future::pending::<()>().await;
        }
    }
}

/// Drives an edge-timing decoder from `source` until shutdown.
///
/// With `poll_interval` set, `start_measurement` is called on the source once
/// immediately and then at that period; a zero period is a `Config` error.
/// Frame-level errors from the source are reported to the sink and the
/// session goes on. A source that closes its stream ends the session with
/// `StreamClosed`.
pub async fn run_edge_session<S, C, K>(
    mut source: S,
    mut consumer: C,
    sink: &mut K,
    mut shutdown: watch::Receiver<bool>,
    poll_interval: Option<Duration>,
) -> Result<DecoderStats, MeterError>
where
    S: EdgeSource,
    C: EdgeConsumer,
    K: MeasurementSink + ?Sized,
{
    let name = consumer.name();
    let mut ticker = match poll_interval {
        Some(period) if period.is_zero() => {
            return Err(MeterError::Config(format!("{name}: poll interval must be positive")));
        }
        period => period.map(tokio::time::interval),
    };
    log_info(&format!("Starting {name} session"));

    let mut throttle = LogThrottle::new(60_000, 5);
    let mut result = Ok(());

    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                log_info(&format!("Stopping {name} session"));
                break;
            }
            _ = async {
                match ticker.as_mut() {
                    Some(t) => { t.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Err(e) = source.start_measurement().await {
                    crate::log_warn_throttled!(throttle, "{name}: start pulse failed: {e}");
                    sink.add_error(&e);
                }
            }
            edge = source.next_edge() => {
                match edge {
                    Ok(Some(event)) => {
                        if let Some(measurement) = consumer.consume(event) {
                            sink.add_fields(measurement);
                        }
                    }
                    Ok(None) => {
                        result = Err(MeterError::StreamClosed(format!("{name} edge source")));
                        break;
                    }
                    Err(e) if e.is_frame_error() => sink.add_error(&e),
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }
        }
    }

    let stats = consumer.stats();
    stats.log_summary(name);
    result.map(|_| stats)
}

/// Reads telegram bytes from `reader` until shutdown.
///
/// Valid packets go to the sink as measurements; rejected frames are reported
/// through `add_error` and the stream continues. End of stream ends the
/// session with `StreamClosed` once any buffered last line is flushed; a read
/// error ends it with `SerialPortError`.
pub async fn run_telegram_session<R, K>(
    mut reader: R,
    assembler: &mut TelegramFrameAssembler,
    sink: &mut K,
    mut shutdown: watch::Receiver<bool>,
) -> Result<DecoderStats, MeterError>
where
    R: AsyncRead + Unpin,
    K: MeasurementSink + ?Sized,
{
    log_info("Starting p1 session");
    let mut throttle = LogThrottle::new(60_000, 5);
    let mut buf = [0u8; READ_CHUNK];

    let result = loop {
        let n = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                log_info("Stopping p1 session");
                break Ok(());
            }
            read = reader.read(&mut buf) => read,
        };

        match n {
            Ok(0) => {
                if let Some(outcome) = assembler.finish() {
                    deliver(outcome, sink, &mut throttle);
                }
                break Err(MeterError::StreamClosed("p1 serial stream".into()));
            }
            Ok(n) => {
                for outcome in assembler.push_bytes(&buf[..n]) {
                    deliver(outcome, sink, &mut throttle);
                }
            }
            Err(e) => break Err(MeterError::SerialPortError(e.to_string())),
        }
    };

    let stats = assembler.stats();
    stats.log_summary("p1");
    result.map(|_| stats)
}

fn deliver<K: MeasurementSink + ?Sized>(
    outcome: FrameOutcome,
    sink: &mut K,
    throttle: &mut LogThrottle,
) {
    match outcome {
        FrameOutcome::Packet(packet) => {
            log_debug(&format!("P1 telegram from {}", packet.header));
            sink.add_fields(packet.to_measurement());
        }
        FrameOutcome::Rejected(error) if error.is_frame_error() => {
            if throttle.allow() {
                let suppressed = throttle.take_suppressed();
                if suppressed > 0 {
                    log_warn(&format!(
                        "P1 frame dropped: {error} ({suppressed} similar suppressed)"
                    ));
                } else {
                    log_warn(&format!("P1 frame dropped: {error}"));
                }
            }
            sink.add_error(&error);
        }
        FrameOutcome::Rejected(error) => {
            log_error(&format!("P1 decoder error: {error}"));
            sink.add_error(&error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{ChannelEdgeSource, EdgeEvent, PulseCounter};
    use crate::sink::MemorySink;

    #[tokio::test]
    async fn test_edge_session_ends_when_source_closes() {
        let (tx, source) = ChannelEdgeSource::channel();
        tx.send(EdgeEvent::falling(0)).unwrap();
        tx.send(EdgeEvent::rising(1_200_000)).unwrap();
        drop(tx);

        let (_stop, shutdown) = watch::channel(false);
        let mut sink = MemorySink::new();
        let result = run_edge_session(source, PulseCounter::new(), &mut sink, shutdown, None).await;

        assert!(matches!(result, Err(MeterError::StreamClosed(_))));
        assert_eq!(sink.measurements.len(), 1);
    }

    #[tokio::test]
    async fn test_edge_session_stops_on_shutdown() {
        let (_tx, source) = ChannelEdgeSource::channel();
        let (stop, shutdown) = watch::channel(false);
        stop.send(true).unwrap();

        let mut sink = MemorySink::new();
        let stats = run_edge_session(source, PulseCounter::new(), &mut sink, shutdown, None)
            .await
            .unwrap();
        assert_eq!(stats, DecoderStats::default());
    }

    #[tokio::test]
    async fn test_edge_session_rejects_zero_poll_interval() {
        let (_tx, source) = ChannelEdgeSource::channel();
        let (_stop, shutdown) = watch::channel(false);
        let mut sink = MemorySink::new();
        let result = run_edge_session(
            source,
            PulseCounter::new(),
            &mut sink,
            shutdown,
            Some(Duration::ZERO),
        )
        .await;
        assert!(matches!(result, Err(MeterError::Config(_))));
    }

    #[tokio::test]
    async fn test_telegram_session_eof_is_stream_closed() {
        let mut assembler = TelegramFrameAssembler::new();
        let mut sink = MemorySink::new();
        let (_stop, shutdown) = watch::channel(false);
        let input: &[u8] = b"/HDR\r\n!0000";

        let result = run_telegram_session(input, &mut assembler, &mut sink, shutdown).await;
        assert!(matches!(result, Err(MeterError::StreamClosed(_))));
        // The unterminated checksum line is still processed
        assert_eq!(assembler.stats().checksum_errors, 1);
        assert_eq!(sink.errors.len(), 1);
        assert!(sink.measurements.is_empty());
    }
}
