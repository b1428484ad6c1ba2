//! # Telegram Frame Assembler
//!
//! Turns the serial byte stream into lines and the lines into telegrams.
//! A frame starts at a line beginning with `/` and ends at a line beginning
//! with `!`. Every line in between, the `/` line included, is kept verbatim
//! with a CRLF suffix so the checksum can be recomputed over exactly the
//! bytes the meter sent.
//!
//! ```text
//! /ISK5\2M550T-1012          <- header, starts the frame
//!                             <- blank lines count towards the checksum
//! 1-0:1.8.1(12345.678*kWh)   <- fields
//! !13A9                       <- CRC-16 over "/ISK5...\r\n...\r\n!"
//! ```
//!
//! Nothing is emitted before the checksum has been verified. A field that
//! fails to parse aborts the frame immediately; the rest of it is skipped
//! until the next `/`.

use crate::constants::{P1_FRAME_END, P1_FRAME_START, P1_LINE_TERMINATOR, P1_MAX_LINE_LENGTH};
use crate::error::MeterError;
use crate::logging::log_debug;
use crate::p1::checksum::verify;
use crate::p1::field::{apply_line, FieldOutcome};
use crate::p1::packet::TelegramPacket;
use crate::stats::DecoderStats;
use crate::util::logging::log_frame_hex;
use bytes::{Bytes, BytesMut};

/// What a completed or aborted frame produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A frame whose checksum matched
    Packet(TelegramPacket),
    /// A frame dropped because of the contained error
    Rejected(MeterError),
}

/// Splits a byte stream into lines on `\n`, dropping a trailing `\r`.
///
/// Lines are returned as raw bytes; no text decoding happens here.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    max_len: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(P1_MAX_LINE_LENGTH)
    }
}

impl LineBuffer {
    pub fn new(max_len: usize) -> Self {
        LineBuffer {
            buf: BytesMut::with_capacity(1024),
            max_len,
            discarding: false,
        }
    }

    /// Appends bytes and returns every line completed by them.
    ///
    /// An overlong line yields one `LineTooLong` error and is skipped up to
    /// its terminating newline.
    pub fn push(&mut self, data: &[u8]) -> Vec<Result<Bytes, MeterError>> {
        self.buf.extend_from_slice(data);
        let mut lines = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos + 1);
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if pos > self.max_len {
                lines.push(Err(MeterError::LineTooLong(self.max_len)));
                continue;
            }
            line.truncate(pos);
            lines.push(Ok(strip_cr(line)));
        }

        if self.buf.len() > self.max_len {
            if !self.discarding {
                lines.push(Err(MeterError::LineTooLong(self.max_len)));
            }
            self.discarding = true;
            self.buf.clear();
        }
        lines
    }

    /// Returns the final unterminated line, if any, at end of stream.
    pub fn take_remainder(&mut self) -> Option<Bytes> {
        if std::mem::take(&mut self.discarding) || self.buf.is_empty() {
            self.buf.clear();
            return None;
        }
        Some(strip_cr(self.buf.split()))
    }
}

fn strip_cr(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

/// Frame/field state machine for one telegram source.
#[derive(Debug, Default)]
pub struct TelegramFrameAssembler {
    reading: bool,
    raw_frame: Vec<u8>,
    packet: TelegramPacket,
    lines: LineBuffer,
    stats: DecoderStats,
}

impl TelegramFrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame is currently open.
    pub fn is_reading(&self) -> bool {
        self.reading
    }

    /// Bytes accumulated for the current (or most recently completed) frame,
    /// without the `!` terminator.
    pub fn raw_frame(&self) -> &[u8] {
        &self.raw_frame
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feeds raw bytes from the transport.
    pub fn push_bytes(&mut self, data: &[u8]) -> Vec<FrameOutcome> {
        let mut outcomes = Vec::new();
        for line in self.lines.push(data) {
            match line {
                Ok(line) => outcomes.extend(self.push_line(&line)),
                Err(e) => outcomes.push(self.abort(e)),
            }
        }
        outcomes
    }

    /// Processes any unterminated last line at end of stream.
    pub fn finish(&mut self) -> Option<FrameOutcome> {
        let rest = self.lines.take_remainder()?;
        self.push_line(&rest)
    }

    /// Processes one line (without its line separator).
    ///
    /// Content lines that are not valid UTF-8 are kept for the checksum but
    /// otherwise ignored.
    pub fn push_line(&mut self, line: &[u8]) -> Option<FrameOutcome> {
        let line = line.trim_ascii();
        let mut outcome = None;

        if let Some(&first) = line.first() {
            if self.reading {
                if first == P1_FRAME_END {
                    self.reading = false;
                    outcome = Some(self.finish_frame(&line[1..]));
                } else {
                    let applied = match std::str::from_utf8(line) {
                        Ok(text) => apply_line(&mut self.packet, text),
                        Err(_) => Ok(FieldOutcome::NotAField),
                    };
                    match applied {
                        Ok(FieldOutcome::Applied(_)) => {}
                        Ok(FieldOutcome::Ignored) | Ok(FieldOutcome::NotAField) => {
                            self.stats.ignored += 1
                        }
                        Err(e) => {
                            self.stats.parse_errors += 1;
                            self.reading = false;
                            outcome = Some(FrameOutcome::Rejected(e));
                        }
                    }
                }
            } else if first == P1_FRAME_START {
                self.begin_frame(&line[1..]);
            } else {
                self.stats.ignored += 1;
            }
        }

        if self.reading {
            self.raw_frame.extend_from_slice(line);
            self.raw_frame.extend_from_slice(P1_LINE_TERMINATOR.as_bytes());
        }
        outcome
    }

    fn begin_frame(&mut self, header: &[u8]) {
        let header = String::from_utf8_lossy(header);
        log_debug(&format!("P1 frame start: {header}"));
        self.packet = TelegramPacket::new(&header);
        self.raw_frame.clear();
        self.reading = true;
    }

    fn finish_frame(&mut self, digits: &[u8]) -> FrameOutcome {
        log_frame_hex("P1 frame", &self.raw_frame);

        let digits = String::from_utf8_lossy(digits);
        if let Err(e) = verify(&self.raw_frame, &digits) {
            self.stats.checksum_errors += 1;
            return FrameOutcome::Rejected(e);
        }

        self.stats.frames_ok += 1;
        FrameOutcome::Packet(std::mem::take(&mut self.packet))
    }

    fn abort(&mut self, error: MeterError) -> FrameOutcome {
        if self.reading {
            log_debug(&format!("P1 frame aborted: {error}"));
        }
        self.reading = false;
        self.stats.parse_errors += 1;
        FrameOutcome::Rejected(error)
    }
}
