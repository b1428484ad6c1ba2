//! Per-decoder counters.
//!
//! The GPIO decoders drop bad frames without reporting them, so these
//! counters are the only place where a flaky sensor or a noisy cable shows up.

use crate::logging::log_info;
use serde::Serialize;

/// Counters kept by every decoder instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames (or pulses) that produced a measurement
    pub frames_ok: u64,
    /// Frames dropped because the transmitted checksum did not match
    pub checksum_errors: u64,
    /// Telegram frames aborted by a field that failed to parse
    pub parse_errors: u64,
    /// DHT frames abandoned on an interval that is neither a 0 nor a 1
    pub invalid_bits: u64,
    /// DHT readings outside the calibrated humidity/temperature range
    pub out_of_range: u64,
    /// Edges or lines that were seen but ignored
    pub ignored: u64,
}

impl DecoderStats {
    pub fn log_summary(&self, source: &str) {
        log_info(&format!(
            "{source}: ok={}, checksum_errors={}, parse_errors={}, invalid_bits={}, out_of_range={}, ignored={}",
            self.frames_ok,
            self.checksum_errors,
            self.parse_errors,
            self.invalid_bits,
            self.out_of_range,
            self.ignored
        ));
    }
}
