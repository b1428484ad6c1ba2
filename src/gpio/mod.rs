//! The gpio module contains the decoders driven by GPIO edge timings: the
//! DHT22 bit-stream reconstructor and the water meter pulse counter, plus the
//! edge source abstraction that feeds them.

pub mod dht;
pub mod edge;
pub mod pulse;

#[cfg(feature = "raspberry-pi")]
pub mod rppal_source;

pub use dht::{decode_frame, DecodeState, DecodedReading, EdgeTimingDecoder, FrameRejection};
pub use edge::{ChannelEdgeSource, EdgeEvent, EdgeKind, EdgeSource};
pub use pulse::PulseCounter;

#[cfg(feature = "raspberry-pi")]
pub use rppal_source::RppalEdgeSource;

use crate::sink::Measurement;
use crate::stats::DecoderStats;

/// A decoder that turns edge events into measurements.
pub trait EdgeConsumer: Send {
    /// Measurement name produced by this consumer.
    fn name(&self) -> &'static str;

    /// Processes one edge; returns a measurement when one is complete.
    fn consume(&mut self, event: EdgeEvent) -> Option<Measurement>;

    fn stats(&self) -> DecoderStats;
}
