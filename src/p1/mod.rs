//! The p1 module decodes DSMR P1 telegrams: line and frame assembly, field
//! parsing, CRC validation and the serial transport that feeds them.

pub mod assembler;
pub mod checksum;
pub mod field;
pub mod packet;
pub mod serial;

pub use assembler::{FrameOutcome, LineBuffer, TelegramFrameAssembler};
pub use checksum::{frame_checksum, verify};
pub use field::{apply_line, parse_line, update_field, FieldKind, FieldOutcome, Register};
pub use packet::{render_telegram, TelegramPacket};

use crate::error::MeterError;
use std::path::Path;

/// Decodes a recorded telegram capture (raw bytes as read from the port).
pub fn decode_capture<P: AsRef<Path>>(path: P) -> Result<Vec<FrameOutcome>, MeterError> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|e| MeterError::Other(format!("could not read {}: {e}", path.display())))?;

    let mut assembler = TelegramFrameAssembler::new();
    let mut outcomes = assembler.push_bytes(&data);
    outcomes.extend(assembler.finish());
    assembler.stats().log_summary(&path.display().to_string());
    Ok(outcomes)
}
