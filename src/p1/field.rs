//! # Telegram Field Parser
//!
//! A content line has the shape `<object-id>(<value>)(<value>)...` where the
//! object identifier is an OBIS code such as `1-0:1.8.1`. Only the first value
//! group is interpreted; further groups are accepted and ignored.
//!
//! Recognized identifiers are routed through a lookup table to a typed
//! register; everything else is accepted without effect.

use crate::constants::{
    OBIS_ENERGY_HIGH, OBIS_ENERGY_LOW, OBIS_EQUIPMENT_ID, OBIS_GAS, OBIS_POWER_CURRENT,
    OBIS_TARIFF,
};
use crate::error::MeterError;
use crate::p1::packet::TelegramPacket;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    multi::many1,
    sequence::delimited,
    IResult,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A content line split into identifier and value groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObisLine<'a> {
    pub id: &'a str,
    pub values: Vec<&'a str>,
}

impl<'a> ObisLine<'a> {
    /// The value group this crate interprets.
    pub fn first_value(&self) -> &'a str {
        self.values.first().copied().unwrap_or_default()
    }
}

fn obis_id(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit() || matches!(c, '-' | '.' | ':'))(input)
}

fn value_group(input: &str) -> IResult<&str, &str> {
    delimited(char('('), take_while(|c: char| c != ')'), char(')'))(input)
}

fn obis_line(input: &str) -> IResult<&str, ObisLine<'_>> {
    let (input, id) = obis_id(input)?;
    let (input, values) = many1(value_group)(input)?;
    Ok((input, ObisLine { id, values }))
}

/// Splits a line into identifier and value groups, or `None` if the line
/// does not follow the field grammar. Trailing text after the last group is
/// tolerated.
pub fn parse_line(line: &str) -> Option<ObisLine<'_>> {
    obis_line(line).ok().map(|(_, parsed)| parsed)
}

/// How a register's value text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Raw string
    Text,
    /// Decimal integer
    Integer,
    /// `<number>*kWh`, stored as watt-hours
    ScaledKwh,
    /// `<number>*m3`, stored unscaled
    CubicMeters,
}

/// Packet field a register updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    EquipmentId,
    Tariff,
    LowConsumed,
    HighConsumed,
    CurrentConsumed,
    GasConsumed,
}

impl Register {
    pub fn kind(self) -> FieldKind {
        match self {
            Register::EquipmentId => FieldKind::Text,
            Register::Tariff => FieldKind::Integer,
            Register::LowConsumed | Register::HighConsumed | Register::CurrentConsumed => {
                FieldKind::ScaledKwh
            }
            Register::GasConsumed => FieldKind::CubicMeters,
        }
    }
}

static FIELD_TABLE: Lazy<HashMap<&'static str, Register>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(OBIS_EQUIPMENT_ID, Register::EquipmentId);
    table.insert(OBIS_TARIFF, Register::Tariff);
    table.insert(OBIS_ENERGY_LOW, Register::LowConsumed);
    table.insert(OBIS_ENERGY_HIGH, Register::HighConsumed);
    table.insert(OBIS_POWER_CURRENT, Register::CurrentConsumed);
    for id in OBIS_GAS {
        table.insert(id, Register::GasConsumed);
    }
    table
});

/// Looks up the register for an object identifier.
pub fn lookup(id: &str) -> Option<Register> {
    FIELD_TABLE.get(id).copied()
}

/// Result of handing one line to the field parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// A known register was updated
    Applied(Register),
    /// The line is a field, but not one this crate tracks
    Ignored,
    /// The line does not follow the field grammar
    NotAField,
}

fn leading_number(value: &str) -> Result<f64, std::num::ParseFloatError> {
    value.split('*').next().unwrap_or_default().parse::<f64>()
}

/// Applies one identifier/value pair to `packet`.
pub fn update_field(
    packet: &mut TelegramPacket,
    id: &str,
    value: &str,
) -> Result<FieldOutcome, MeterError> {
    let Some(register) = lookup(id) else {
        return Ok(FieldOutcome::Ignored);
    };

    match register.kind() {
        FieldKind::Text => packet.eid = value.to_string(),
        FieldKind::Integer => {
            packet.tariff = value
                .parse::<i64>()
                .map_err(|_| MeterError::InvalidTariff(value.to_string()))?;
        }
        FieldKind::ScaledKwh => {
            let kwh = leading_number(value).map_err(|_| MeterError::InvalidKwh(value.to_string()))?;
            let wh = (kwh * 1000.0) as i64;
            match register {
                Register::LowConsumed => packet.low_consumed_wh = wh,
                Register::HighConsumed => packet.high_consumed_wh = wh,
                _ => packet.current_consumed_wh = wh,
            }
        }
        FieldKind::CubicMeters => {
            let m3 = leading_number(value)
                .map_err(|_| MeterError::InvalidCubicMeters(value.to_string()))?;
            packet.gas_consumed_l = m3 as i64;
        }
    }
    Ok(FieldOutcome::Applied(register))
}

/// Parses a content line and applies it to `packet`.
pub fn apply_line(packet: &mut TelegramPacket, line: &str) -> Result<FieldOutcome, MeterError> {
    match parse_line(line) {
        Some(parsed) => update_field(packet, parsed.id, parsed.first_value()),
        None => Ok(FieldOutcome::NotAField),
    }
}
