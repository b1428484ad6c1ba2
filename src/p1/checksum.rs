//! # Telegram Checksum
//!
//! DSMR 4+ telegrams end with `!` followed by four hex digits: a CRC-16 over
//! every byte from the leading `/` up to and including the `!`. The CRC uses
//! polynomial 0x8005, reflected input and output, initial value 0 and no
//! final XOR (the CRC-16/ARC parameter set).

use crate::error::MeterError;
use crc::{Crc, CRC_16_ARC};

pub const P1_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// CRC over the accumulated frame bytes followed by the `!` terminator.
pub fn frame_checksum(raw_frame: &[u8]) -> u16 {
    let mut digest = P1_CRC.digest();
    digest.update(raw_frame);
    digest.update(b"!");
    digest.finalize()
}

/// Parses the hex digits transmitted after `!`.
pub fn parse_transmitted(digits: &str) -> Result<u16, MeterError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MeterError::MalformedChecksum(digits.to_string()));
    }
    u16::from_str_radix(digits, 16).map_err(|_| MeterError::MalformedChecksum(digits.to_string()))
}

/// Checks a frame against its transmitted checksum digits.
pub fn verify(raw_frame: &[u8], digits: &str) -> Result<(), MeterError> {
    let given = parse_transmitted(digits)?;
    let computed = frame_checksum(raw_frame);
    if given != computed {
        return Err(MeterError::ChecksumMismatch { given, computed });
    }
    Ok(())
}
