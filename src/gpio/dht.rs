//! # DHT22 Edge-Timing Decoder
//!
//! The DHT22 answers a start pulse with a 40-bit frame. Listening on rising
//! edges only, each bit shows up as the interval between two consecutive
//! rising edges: roughly 80 µs for a `0` and 120 µs for a `1`. A long quiet
//! period precedes every frame and serves as the sync marker.
//!
//! ```text
//!          4      3      2      1      0        byte index in the 40-bit word
//!       +------+------+------+------+------+
//!       | RH%  | RH%  | temp | temp |check-|    transmitted left to right,
//!       | MSB  | LSB  | MSB  | LSB  |sum   |    most significant bit first
//!       +------+------+------+------+------+
//! ```
//!
//! Rejected frames (invalid bit, checksum, implausible values) are normal
//! sensor noise: they are counted and logged at debug level, never reported
//! as errors.

use crate::constants::{
    DHT_FRAME_BITS, DHT_MAX_HUMIDITY, DHT_MAX_TEMPERATURE, DHT_MIN_TEMPERATURE,
    DHT_ONE_LIMIT_TICKS, DHT_PREAMBLE_INTERVALS, DHT_SYNC_MIN_TICKS, DHT_ZERO_MAX_TICKS,
    DHT_ZERO_MIN_TICKS, MEASUREMENT_DHT22,
};
use crate::gpio::edge::EdgeEvent;
use crate::gpio::EdgeConsumer;
use crate::sink::Measurement;
use crate::stats::DecoderStats;
use crate::util::tick::TickTracker;

/// Where the decoder is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// No sync seen yet
    Idle,
    /// Sync seen; `remaining` start-sequence intervals still to absorb
    Syncing { remaining: u8 },
    /// `bits` data bits collected into `code`, most significant first
    Accumulating { bits: u8, code: u64 },
    /// A full frame was decoded; waiting for the next sync
    Complete,
    /// An invalid bit ended the frame; waiting for the next sync
    Aborted,
}

/// Classification of a single bit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitClass {
    Zero,
    One,
    Invalid,
}

/// Classifies one rising-edge-to-rising-edge interval.
pub fn classify_interval(interval: u32) -> BitClass {
    if (DHT_ZERO_MIN_TICKS..=DHT_ZERO_MAX_TICKS).contains(&interval) {
        BitClass::Zero
    } else if interval > DHT_ZERO_MAX_TICKS && interval < DHT_ONE_LIMIT_TICKS {
        BitClass::One
    } else {
        BitClass::Invalid
    }
}

/// A validated, calibrated sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedReading {
    /// Temperature in °C, one decimal
    pub temperature_c: f64,
    /// Relative humidity in %, one decimal
    pub humidity_pct: f64,
}

impl DecodedReading {
    pub fn to_measurement(&self) -> Measurement {
        Measurement::new(MEASUREMENT_DHT22)
            .with_field("temperature", self.temperature_c)
            .with_field("humidity", self.humidity_pct)
    }
}

/// Why a complete 40-bit frame produced no reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRejection {
    Checksum { transmitted: u8, computed: u8 },
    Humidity(f64),
    Temperature(f64),
}

/// Splits a 40-bit frame into its five bytes, checksum first.
pub fn frame_bytes(code: u64) -> [u8; 5] {
    core::array::from_fn(|i| (code >> (8 * i)) as u8)
}

/// Validates and calibrates a complete 40-bit frame.
pub fn decode_frame(code: u64) -> Result<DecodedReading, FrameRejection> {
    let b = frame_bytes(code);

    let computed = b[1..].iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
    if computed != b[0] {
        return Err(FrameRejection::Checksum {
            transmitted: b[0],
            computed,
        });
    }

    let humidity = f64::from((u16::from(b[4]) << 8) + u16::from(b[3])) / 10.0;
    if humidity > DHT_MAX_HUMIDITY {
        return Err(FrameRejection::Humidity(humidity));
    }

    let divisor = if b[2] & 0x80 != 0 { -10.0 } else { 10.0 };
    let temperature = f64::from((u16::from(b[2] & 0x7F) << 8) + u16::from(b[1])) / divisor;
    if !(DHT_MIN_TEMPERATURE..=DHT_MAX_TEMPERATURE).contains(&temperature) {
        return Err(FrameRejection::Temperature(temperature));
    }

    Ok(DecodedReading {
        temperature_c: round_one_decimal(temperature),
        humidity_pct: round_one_decimal(humidity),
    })
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Reconstructs DHT22 frames from bit intervals.
#[derive(Debug, Clone)]
pub struct EdgeTimingDecoder {
    state: DecodeState,
    clock: TickTracker,
    stats: DecoderStats,
}

impl Default for EdgeTimingDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeTimingDecoder {
    pub fn new() -> Self {
        EdgeTimingDecoder {
            state: DecodeState::Idle,
            clock: TickTracker::new(),
            stats: DecoderStats::default(),
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drops any frame in progress and forgets the previous tick.
    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
        self.clock.reset();
    }

    /// Feeds a raw edge event; the interval is taken from the previous event.
    pub fn on_edge(&mut self, event: EdgeEvent) -> Option<DecodedReading> {
        let interval = self.clock.observe(event.tick)?;
        self.push_interval(interval)
    }

    /// Advances the state machine by one interval.
    ///
    /// Returns a reading when this interval completed a valid frame.
    pub fn push_interval(&mut self, interval: u32) -> Option<DecodedReading> {
        if interval > DHT_SYNC_MIN_TICKS {
            self.state = Self::after_sync(DHT_PREAMBLE_INTERVALS);
            return None;
        }

        match self.state {
            DecodeState::Idle | DecodeState::Complete | DecodeState::Aborted => {
                self.stats.ignored += 1;
                None
            }
            DecodeState::Syncing { remaining } => {
                self.state = Self::after_sync(remaining - 1);
                None
            }
            DecodeState::Accumulating { bits, code } => {
                let code = match classify_interval(interval) {
                    BitClass::Zero => code << 1,
                    BitClass::One => (code << 1) | 1,
                    BitClass::Invalid => {
                        log::debug!("DHT22: invalid bit interval {interval} after {bits} bits");
                        self.stats.invalid_bits += 1;
                        self.state = DecodeState::Aborted;
                        return None;
                    }
                };

                let bits = bits + 1;
                if bits < DHT_FRAME_BITS {
                    self.state = DecodeState::Accumulating { bits, code };
                    return None;
                }

                self.state = DecodeState::Complete;
                self.finish(code)
            }
        }
    }

    fn after_sync(remaining: u8) -> DecodeState {
        if remaining == 0 {
            DecodeState::Accumulating { bits: 0, code: 0 }
        } else {
            DecodeState::Syncing { remaining }
        }
    }

    fn finish(&mut self, code: u64) -> Option<DecodedReading> {
        match decode_frame(code) {
            Ok(reading) => {
                self.stats.frames_ok += 1;
                Some(reading)
            }
            Err(rejection) => {
                log::debug!("DHT22: frame {code:010X} rejected: {rejection:?}");
                match rejection {
                    FrameRejection::Checksum { .. } => self.stats.checksum_errors += 1,
                    FrameRejection::Humidity(_) | FrameRejection::Temperature(_) => {
                        self.stats.out_of_range += 1
                    }
                }
                None
            }
        }
    }
}

impl EdgeConsumer for EdgeTimingDecoder {
    fn name(&self) -> &'static str {
        MEASUREMENT_DHT22
    }

    fn consume(&mut self, event: EdgeEvent) -> Option<Measurement> {
        self.on_edge(event).map(|r| r.to_measurement())
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_frame(decoder: &mut EdgeTimingDecoder, code: u64) -> Option<DecodedReading> {
        decoder.push_interval(12_000);
        decoder.push_interval(80);
        decoder.push_interval(80);
        let mut out = None;
        for i in (0..40).rev() {
            let interval = if (code >> i) & 1 == 1 { 120 } else { 80 };
            out = decoder.push_interval(interval);
        }
        out
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_interval(59), BitClass::Invalid);
        assert_eq!(classify_interval(60), BitClass::Zero);
        assert_eq!(classify_interval(100), BitClass::Zero);
        assert_eq!(classify_interval(101), BitClass::One);
        assert_eq!(classify_interval(149), BitClass::One);
        assert_eq!(classify_interval(150), BitClass::Invalid);
    }

    #[test]
    fn test_frame_bytes_order() {
        assert_eq!(frame_bytes(0x02_8A_81_48_55), [0x55, 0x48, 0x81, 0x8A, 0x02]);
    }

    #[test]
    fn test_decode_negative_temperature() {
        let reading = decode_frame(0x02_8A_81_48_55).unwrap();
        assert_eq!(reading.humidity_pct, 65.0);
        assert_eq!(reading.temperature_c, -32.8);
    }

    #[test]
    fn test_decode_rejects_humidity_out_of_range() {
        // RH 0x0456 = 1110 -> 111.0 %
        let (b4, b3, b2, b1) = (0x04u8, 0x56u8, 0x00u8, 0xC8u8);
        let sum = b4.wrapping_add(b3).wrapping_add(b2).wrapping_add(b1);
        let code = u64::from_be_bytes([0, 0, 0, b4, b3, b2, b1, sum]);
        assert_eq!(decode_frame(code), Err(FrameRejection::Humidity(111.0)));
    }

    #[test]
    fn test_decode_rejects_temperature_out_of_range() {
        // -50.1 °C
        let (b4, b3, b2, b1) = (0x01u8, 0xF4u8, 0x81u8, 0xF5u8);
        let sum = b4.wrapping_add(b3).wrapping_add(b2).wrapping_add(b1);
        let code = u64::from_be_bytes([0, 0, 0, b4, b3, b2, b1, sum]);
        assert_eq!(decode_frame(code), Err(FrameRejection::Temperature(-50.1)));
    }

    #[test]
    fn test_state_transitions() {
        let mut decoder = EdgeTimingDecoder::new();
        assert_eq!(decoder.state(), DecodeState::Idle);

        decoder.push_interval(80);
        assert_eq!(decoder.state(), DecodeState::Idle);

        decoder.push_interval(10_001);
        assert_eq!(decoder.state(), DecodeState::Syncing { remaining: 2 });
        decoder.push_interval(80);
        assert_eq!(decoder.state(), DecodeState::Syncing { remaining: 1 });
        decoder.push_interval(80);
        assert_eq!(decoder.state(), DecodeState::Accumulating { bits: 0, code: 0 });
        decoder.push_interval(120);
        assert_eq!(decoder.state(), DecodeState::Accumulating { bits: 1, code: 1 });
        decoder.push_interval(80);
        assert_eq!(decoder.state(), DecodeState::Accumulating { bits: 2, code: 2 });
        decoder.push_interval(200);
        assert_eq!(decoder.state(), DecodeState::Aborted);
        assert_eq!(decoder.stats().invalid_bits, 1);
    }

    #[test]
    fn test_sync_interval_is_exclusive() {
        let mut decoder = EdgeTimingDecoder::new();
        decoder.push_interval(10_000);
        assert_eq!(decoder.state(), DecodeState::Idle);
    }

    #[test]
    fn test_full_frame_emits_reading() {
        let mut decoder = EdgeTimingDecoder::new();
        let reading = feed_frame(&mut decoder, 0x02_8A_81_48_55).unwrap();
        assert_eq!(reading.humidity_pct, 65.0);
        assert_eq!(reading.temperature_c, -32.8);
        assert_eq!(decoder.state(), DecodeState::Complete);
        assert_eq!(decoder.stats().frames_ok, 1);

        // Bits after completion are ignored until the next sync
        assert_eq!(decoder.push_interval(80), None);
        assert_eq!(decoder.state(), DecodeState::Complete);
    }

    #[test]
    fn test_corrupted_checksum_emits_nothing() {
        let mut decoder = EdgeTimingDecoder::new();
        assert_eq!(feed_frame(&mut decoder, 0x02_8A_81_48_56), None);
        assert_eq!(decoder.stats().checksum_errors, 1);
    }

    #[test]
    fn test_on_edge_uses_tick_differences() {
        let mut decoder = EdgeTimingDecoder::new();
        let code: u64 = 0x02_8A_81_48_55;
        // Start close to the wrap point so the frame straddles it
        let mut tick = u32::MAX - 20_000;
        assert_eq!(decoder.on_edge(EdgeEvent::rising(tick)), None);
        tick = tick.wrapping_add(15_000);
        decoder.on_edge(EdgeEvent::rising(tick));
        for _ in 0..2 {
            tick = tick.wrapping_add(80);
            decoder.on_edge(EdgeEvent::rising(tick));
        }
        let mut out = None;
        for i in (0..40).rev() {
            tick = tick.wrapping_add(if (code >> i) & 1 == 1 { 120 } else { 80 });
            out = decoder.on_edge(EdgeEvent::rising(tick));
        }
        assert_eq!(
            out,
            Some(DecodedReading {
                temperature_c: -32.8,
                humidity_pct: 65.0
            })
        );
    }
}
