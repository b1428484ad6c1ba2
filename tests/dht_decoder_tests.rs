//! Integration tests for the DHT22 edge-timing decoder.

use homemeter_rs::gpio::{decode_frame, DecodeState, EdgeTimingDecoder, FrameRejection};
use homemeter_rs::{EdgeConsumer, EdgeEvent};
use proptest::prelude::*;

const REFERENCE: u64 = 0x02_8A_81_48_55;

/// Rising-edge ticks for one transmission: sync, two preamble intervals, 40 bits.
fn frame_edges(start: u32, code: u64) -> Vec<EdgeEvent> {
    let mut tick = start;
    let mut edges = vec![EdgeEvent::rising(tick)];
    let mut step = |d: u32, edges: &mut Vec<EdgeEvent>| {
        tick = tick.wrapping_add(d);
        edges.push(EdgeEvent::rising(tick));
    };
    step(20_000, &mut edges);
    step(80, &mut edges);
    step(80, &mut edges);
    for i in (0..40).rev() {
        step(if (code >> i) & 1 == 1 { 120 } else { 80 }, &mut edges);
    }
    edges
}

fn run(decoder: &mut EdgeTimingDecoder, edges: &[EdgeEvent]) -> Vec<(f64, f64)> {
    edges
        .iter()
        .filter_map(|&e| decoder.on_edge(e))
        .map(|r| (r.humidity_pct, r.temperature_c))
        .collect()
}

/// Tests the reference frame: 65.0 % and -32.8 °C.
#[test]
fn test_reference_frame() {
    let mut decoder = EdgeTimingDecoder::new();
    assert_eq!(run(&mut decoder, &frame_edges(1_000, REFERENCE)), vec![(65.0, -32.8)]);
    assert_eq!(decoder.stats().frames_ok, 1);
}

/// Tests that a frame with one flipped bit is dropped silently.
#[test]
fn test_corrupted_frame_is_dropped() {
    let mut decoder = EdgeTimingDecoder::new();
    let corrupted = REFERENCE ^ (1 << 20);
    assert!(run(&mut decoder, &frame_edges(1_000, corrupted)).is_empty());
    assert_eq!(decoder.stats().checksum_errors, 1);
    assert!(matches!(
        decode_frame(corrupted),
        Err(FrameRejection::Checksum { .. })
    ));
}

/// Tests that consecutive frames decode independently.
#[test]
fn test_consecutive_frames_are_independent() {
    let mut decoder = EdgeTimingDecoder::new();
    let mut edges = frame_edges(0, REFERENCE ^ 1);
    let next_start = edges.last().unwrap().tick;
    edges.extend(frame_edges(next_start, REFERENCE).into_iter().skip(1));

    assert_eq!(run(&mut decoder, &edges), vec![(65.0, -32.8)]);
    let stats = decoder.stats();
    assert_eq!(stats.checksum_errors, 1);
    assert_eq!(stats.frames_ok, 1);
}

/// Tests that an invalid bit aborts the frame and a new sync recovers.
#[test]
fn test_invalid_bit_then_resync() {
    let mut decoder = EdgeTimingDecoder::new();
    let mut edges = frame_edges(0, REFERENCE);
    // Stretch bit 10 to an interval that is neither a 0 nor a 1
    let idx = 4 + 10;
    for e in edges.iter_mut().skip(idx) {
        e.tick = e.tick.wrapping_add(200);
    }
    assert!(run(&mut decoder, &edges).is_empty());
    assert_eq!(decoder.state(), DecodeState::Aborted);
    assert_eq!(decoder.stats().invalid_bits, 1);

    let start = edges.last().unwrap().tick;
    let again = frame_edges(start, REFERENCE);
    assert_eq!(run(&mut decoder, &again[1..]), vec![(65.0, -32.8)]);
}

/// Tests the decoder through the consumer interface.
#[test]
fn test_consumer_emits_measurement() {
    let mut decoder = EdgeTimingDecoder::new();
    let measurements: Vec<_> = frame_edges(500, REFERENCE)
        .into_iter()
        .filter_map(|e| decoder.consume(e))
        .collect();
    assert_eq!(measurements.len(), 1);
    assert_eq!(measurements[0].name, "dht22");
    assert_eq!(measurements[0].field("humidity").map(|v| v.as_f64()), Some(65.0));
    assert_eq!(measurements[0].field("temperature").map(|v| v.as_f64()), Some(-32.8));
}

/// Feeds sync, preamble and the 40 bits of `code` as raw intervals.
fn push_code(decoder: &mut EdgeTimingDecoder, code: u64) -> Option<(f64, f64)> {
    let mut last = None;
    for interval in [12_000, 80, 80]
        .into_iter()
        .chain((0..40).rev().map(|i| if (code >> i) & 1 == 1 { 120 } else { 80 }))
    {
        last = decoder.push_interval(interval);
    }
    last.map(|r| (r.humidity_pct, r.temperature_c))
}

fn pack(b: [u8; 5]) -> u64 {
    b.iter()
        .enumerate()
        .fold(0u64, |code, (i, &x)| code | (u64::from(x) << (8 * i)))
}

/// Reading expected from the payload bytes, in whole tenths.
fn expected_reading(b1: u8, b2: u8, b3: u8, b4: u8) -> Option<(f64, f64)> {
    let humidity = (u32::from(b4) << 8) | u32::from(b3);
    let magnitude = (u32::from(b2 & 0x7F) << 8) | u32::from(b1);
    let negative = b2 & 0x80 != 0;
    let in_range = humidity <= 1100 && if negative { magnitude <= 500 } else { magnitude <= 1350 };
    if !in_range {
        return None;
    }
    let temperature = f64::from(magnitude) / 10.0;
    Some((
        f64::from(humidity) / 10.0,
        if negative { -temperature } else { temperature },
    ))
}

proptest! {
    /// Tests that every frame with a correct checksum decodes to the payload
    /// formula, or to nothing when it is out of range.
    #[test]
    fn prop_valid_frame_matches_payload(b1 in any::<u8>(), b2 in any::<u8>(), b3 in any::<u8>(), b4 in any::<u8>()) {
        let b0 = b1.wrapping_add(b2).wrapping_add(b3).wrapping_add(b4);
        let mut decoder = EdgeTimingDecoder::new();
        let got = push_code(&mut decoder, pack([b0, b1, b2, b3, b4]));
        let want = expected_reading(b1, b2, b3, b4);
        prop_assert_eq!(got, want);
        prop_assert_eq!(decoder.stats().checksum_errors, 0);
    }

    /// Tests that any wrong checksum byte suppresses the reading.
    #[test]
    fn prop_wrong_checksum_emits_nothing(
        b1 in any::<u8>(),
        b2 in any::<u8>(),
        b3 in any::<u8>(),
        b4 in any::<u8>(),
        delta in 1u8..=255,
    ) {
        let b0 = b1.wrapping_add(b2).wrapping_add(b3).wrapping_add(b4).wrapping_add(delta);
        let mut decoder = EdgeTimingDecoder::new();
        prop_assert_eq!(push_code(&mut decoder, pack([b0, b1, b2, b3, b4])), None);
        prop_assert_eq!(decoder.stats().checksum_errors, 1);
    }
}
