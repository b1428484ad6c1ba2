//! # Measurement Sink
//!
//! Every successful decode becomes a [`Measurement`]: a named set of numeric
//! fields plus string tags, stamped with the time it was produced. Sinks
//! receive measurements and, on a side channel, per-frame errors.

use crate::error::MeterError;
use crate::logging::{log_error, log_warn};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// A numeric field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::Float(v) => v,
            FieldValue::Integer(v) => v as f64,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Integer(v) => Some(v),
            FieldValue::Float(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

/// One decoded sample ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub tags: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Creates an empty measurement stamped with the current time.
    pub fn new(name: &str) -> Self {
        Measurement {
            name: name.to_string(),
            fields: BTreeMap::new(),
            tags: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Renders the measurement as one line of InfluxDB line protocol.
    ///
    /// Integers carry the `i` suffix; the timestamp is in nanoseconds.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_name(&self.name);
        for (k, v) in &self.tags {
            line.push(',');
            line.push_str(&escape_key(k));
            line.push('=');
            line.push_str(&escape_key(v));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| match v {
                FieldValue::Float(f) => format!("{}={}", escape_key(k), f),
                FieldValue::Integer(i) => format!("{}={}i", escape_key(k), i),
            })
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            line.push(' ');
            line.push_str(&ns.to_string());
        }
        line
    }
}

/// Measurement names escape commas and spaces.
fn escape_name(s: &str) -> String {
    escape_chars(s, &[',', ' '])
}

/// Tag keys, tag values and field keys also escape `=`.
fn escape_key(s: &str) -> String {
    escape_chars(s, &[',', '=', ' '])
}

fn escape_chars(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Receiver of decoded measurements and per-frame errors.
pub trait MeasurementSink: Send {
    fn add_fields(&mut self, measurement: Measurement);

    /// Reports an error that dropped one frame. The stream continues.
    fn add_error(&mut self, error: &MeterError);
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub measurements: Vec<Measurement>,
    pub errors: Vec<MeterError>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasurementSink for MemorySink {
    fn add_fields(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    fn add_error(&mut self, error: &MeterError) {
        self.errors.push(error.clone());
    }
}

/// Output encoding used by [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    LineProtocol,
}

/// Sink that writes one line per measurement and logs errors.
pub struct WriterSink<W: Write + Send> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        WriterSink { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MeasurementSink for WriterSink<W> {
    fn add_fields(&mut self, measurement: Measurement) {
        let line = match self.format {
            OutputFormat::LineProtocol => measurement.to_line_protocol(),
            OutputFormat::Json => match serde_json::to_string(&measurement) {
                Ok(json) => json,
                Err(e) => {
                    log_error(&format!("Failed to serialize measurement {}: {e}", measurement.name));
                    return;
                }
            },
        };
        if let Err(e) = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            log_error(&format!("Failed to write measurement: {e}"));
        }
    }

    fn add_error(&mut self, error: &MeterError) {
        if error.is_frame_error() {
            log_warn(&error.to_string());
        } else {
            log_error(&error.to_string());
        }
    }
}
