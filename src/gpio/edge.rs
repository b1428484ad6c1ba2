//! # GPIO Edge Events
//!
//! The GPIO backend delivers one [`EdgeEvent`] per level change on a watched
//! pin. Events must arrive in the order they were observed; the decoders
//! derive every interval from consecutive ticks and cannot detect reordering.

use crate::error::MeterError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A level change on a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Microsecond tick of the hardware clock, wrapping at 2^32
    pub tick: u32,
    /// Pin level after the change (`true` = high)
    pub level: bool,
}

impl EdgeEvent {
    pub const fn new(tick: u32, level: bool) -> Self {
        Self { tick, level }
    }

    pub const fn rising(tick: u32) -> Self {
        Self { tick, level: true }
    }

    pub const fn falling(tick: u32) -> Self {
        Self { tick, level: false }
    }
}

/// Which transitions a source reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Low to high only
    Rising,
    /// High to low only
    Falling,
    /// Both directions
    Either,
}

/// Ordered stream of edge events from one pin.
#[async_trait]
pub trait EdgeSource: Send {
    /// Waits for the next edge. `Ok(None)` means the producer has gone away.
    async fn next_edge(&mut self) -> Result<Option<EdgeEvent>, MeterError>;

    /// Asks the sensor to start a transmission, for sensors that only talk
    /// when prompted.
    async fn start_measurement(&mut self) -> Result<(), MeterError> {
        Ok(())
    }
}

/// Edge source fed through a tokio channel.
///
/// Interrupt callbacks run on a foreign thread; they push into the sender half
/// and the decoder task drains the receiver.
#[derive(Debug)]
pub struct ChannelEdgeSource {
    rx: mpsc::UnboundedReceiver<EdgeEvent>,
}

impl ChannelEdgeSource {
    /// Creates a connected sender/source pair.
    pub fn channel() -> (mpsc::UnboundedSender<EdgeEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ChannelEdgeSource { rx })
    }
}

#[async_trait]
impl EdgeSource for ChannelEdgeSource {
    async fn next_edge(&mut self) -> Result<Option<EdgeEvent>, MeterError> {
        Ok(self.rx.recv().await)
    }
}
