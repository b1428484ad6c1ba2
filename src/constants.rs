//! Protocol Constants
//!
//! Timing thresholds for the GPIO decoders and the object identifiers and
//! markers of the P1 telegram format.

// ----------------------------------------------------------------------------
// DHT22 edge timing (ticks are microseconds)
// ----------------------------------------------------------------------------

/// Any interval longer than this starts a new DHT frame.
pub const DHT_SYNC_MIN_TICKS: u32 = 10_000;

/// Shortest interval accepted as a `0` bit (inclusive).
pub const DHT_ZERO_MIN_TICKS: u32 = 60;

/// Longest interval accepted as a `0` bit (inclusive).
pub const DHT_ZERO_MAX_TICKS: u32 = 100;

/// A `1` bit lies strictly between `DHT_ZERO_MAX_TICKS` and this value.
pub const DHT_ONE_LIMIT_TICKS: u32 = 150;

/// Intervals after the sync interval that belong to the sensor's start sequence.
pub const DHT_PREAMBLE_INTERVALS: u8 = 2;

/// Data bits per DHT frame.
pub const DHT_FRAME_BITS: u8 = 40;

/// Upper bound for a plausible relative humidity.
pub const DHT_MAX_HUMIDITY: f64 = 110.0;

/// Lower bound for a plausible temperature in °C.
pub const DHT_MIN_TEMPERATURE: f64 = -50.0;

/// Upper bound for a plausible temperature in °C.
pub const DHT_MAX_TEMPERATURE: f64 = 135.0;

// ----------------------------------------------------------------------------
// Water meter pulses
// ----------------------------------------------------------------------------

/// A rising edge counts as one litre only after this many ticks of quiet.
pub const WATER_PULSE_MIN_TICKS: u32 = 1_000_000;

// ----------------------------------------------------------------------------
// P1 telegram
// ----------------------------------------------------------------------------

pub const P1_FRAME_START: u8 = b'/';
pub const P1_FRAME_END: u8 = b'!';
pub const P1_LINE_TERMINATOR: &str = "\r\n";

/// Lines longer than this are discarded by the line splitter.
pub const P1_MAX_LINE_LENGTH: usize = 64 * 1024;

pub const OBIS_EQUIPMENT_ID: &str = "0-0:96.1.1";
pub const OBIS_TARIFF: &str = "0-0:96.14.0";
pub const OBIS_ENERGY_LOW: &str = "1-0:1.8.1";
pub const OBIS_ENERGY_HIGH: &str = "1-0:1.8.2";
pub const OBIS_POWER_CURRENT: &str = "1-0:1.7.0";
pub const OBIS_GAS: [&str; 4] = ["1-1:24.2.1", "1-2:24.2.1", "1-3:24.2.1", "1-4:24.2.1"];

// ----------------------------------------------------------------------------
// Measurement names
// ----------------------------------------------------------------------------

pub const MEASUREMENT_DHT22: &str = "dht22";
pub const MEASUREMENT_WATERMETER: &str = "watermeter";
pub const MEASUREMENT_P1METER: &str = "p1meter";
