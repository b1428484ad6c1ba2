//! # Water Meter Pulse Counter
//!
//! An infrared reflex sensor over the meter's rotating dial produces one
//! rising edge per litre. Contact bounce and the dial's slow edges show up as
//! bursts of short intervals, so only a rising edge preceded by more than a
//! second of quiet counts.

use crate::constants::{MEASUREMENT_WATERMETER, WATER_PULSE_MIN_TICKS};
use crate::gpio::edge::EdgeEvent;
use crate::gpio::EdgeConsumer;
use crate::sink::Measurement;
use crate::stats::DecoderStats;
use crate::util::tick::TickTracker;

/// Debounced counter of meter pulses, listening on both edges.
#[derive(Debug, Clone)]
pub struct PulseCounter {
    clock: TickTracker,
    min_ticks: u32,
    stats: DecoderStats,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    pub fn new() -> Self {
        Self::with_threshold(WATER_PULSE_MIN_TICKS)
    }

    /// Counter with a custom debounce threshold in ticks.
    pub fn with_threshold(min_ticks: u32) -> Self {
        PulseCounter {
            clock: TickTracker::new(),
            min_ticks,
            stats: DecoderStats::default(),
        }
    }

    /// Total pulses counted so far.
    pub fn pulses(&self) -> u64 {
        self.stats.frames_ok
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Whether an interval ending in an edge at `level` is a pulse.
    pub fn qualifies(&self, interval: u32, level: bool) -> bool {
        level && interval > self.min_ticks
    }

    /// Returns `true` if this interval/level pair is one unit of flow.
    pub fn push_interval(&mut self, interval: u32, level: bool) -> bool {
        if self.qualifies(interval, level) {
            self.stats.frames_ok += 1;
            true
        } else {
            self.stats.ignored += 1;
            false
        }
    }

    /// Feeds a raw edge event. The first event only primes the clock.
    pub fn on_edge(&mut self, event: EdgeEvent) -> bool {
        match self.clock.observe(event.tick) {
            Some(interval) => self.push_interval(interval, event.level),
            None => false,
        }
    }

    pub fn unit_measurement() -> Measurement {
        Measurement::new(MEASUREMENT_WATERMETER).with_field("liters", 1i64)
    }
}

impl EdgeConsumer for PulseCounter {
    fn name(&self) -> &'static str {
        MEASUREMENT_WATERMETER
    }

    fn consume(&mut self, event: EdgeEvent) -> Option<Measurement> {
        self.on_edge(event).then(Self::unit_measurement)
    }

    fn stats(&self) -> DecoderStats {
        self.stats
    }
}
