//! Decoded P1 telegram contents.

use crate::constants::{
    MEASUREMENT_P1METER, OBIS_ENERGY_HIGH, OBIS_ENERGY_LOW, OBIS_EQUIPMENT_ID, OBIS_GAS,
    OBIS_POWER_CURRENT, OBIS_TARIFF, P1_LINE_TERMINATOR,
};
use crate::p1::checksum::frame_checksum;
use crate::sink::Measurement;
use serde::Serialize;

/// One validated telegram.
///
/// Energy registers are stored in watt-hours, the gas register in the whole
/// units transmitted by the meter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelegramPacket {
    /// Identification line without the leading `/`
    pub header: String,
    /// Equipment identifier (hex-encoded ASCII as sent)
    pub eid: String,
    pub tariff: i64,
    pub low_consumed_wh: i64,
    pub high_consumed_wh: i64,
    pub current_consumed_wh: i64,
    pub gas_consumed_l: i64,
}

impl TelegramPacket {
    pub fn new(header: &str) -> Self {
        TelegramPacket {
            header: header.to_string(),
            ..Default::default()
        }
    }

    pub fn to_measurement(&self) -> Measurement {
        Measurement::new(MEASUREMENT_P1METER)
            .with_field("low_consumed", self.low_consumed_wh)
            .with_field("high_consumed", self.high_consumed_wh)
            .with_field("current_consumed", self.current_consumed_wh)
            .with_field("gas_consumed", self.gas_consumed_l)
            .with_tag("tarief", self.tariff.to_string())
    }
}

fn kwh(wh: i64) -> String {
    format!("{:06}.{:03}*kWh", wh / 1000, (wh % 1000).abs())
}

/// Renders a packet as a complete telegram including a valid checksum line.
///
/// Every field is written, with the gas register on channel 1. Values are
/// formatted the way DSMR meters send them.
pub fn render_telegram(packet: &TelegramPacket) -> String {
    let lines = [
        format!("/{}", packet.header),
        String::new(),
        format!("{OBIS_EQUIPMENT_ID}({})", packet.eid),
        format!("{OBIS_ENERGY_LOW}({})", kwh(packet.low_consumed_wh)),
        format!("{OBIS_ENERGY_HIGH}({})", kwh(packet.high_consumed_wh)),
        format!("{OBIS_TARIFF}({:04})", packet.tariff),
        format!("{OBIS_POWER_CURRENT}({})", kwh(packet.current_consumed_wh)),
        format!("{}({:05}.000*m3)", OBIS_GAS[0], packet.gas_consumed_l),
    ];

    let mut raw = String::new();
    for line in &lines {
        raw.push_str(line);
        raw.push_str(P1_LINE_TERMINATOR);
    }
    let crc = frame_checksum(raw.as_bytes());
    raw.push_str(&format!("!{crc:04X}{P1_LINE_TERMINATOR}"));
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_measurement() {
        let packet = TelegramPacket {
            tariff: 2,
            low_consumed_wh: 12_345_678,
            current_consumed_wh: 500,
            ..TelegramPacket::new("ISK5\\2M550T-1012")
        };
        let m = packet.to_measurement();
        assert_eq!(m.name, "p1meter");
        assert_eq!(m.field("low_consumed").and_then(|v| v.as_i64()), Some(12_345_678));
        assert_eq!(m.field("high_consumed").and_then(|v| v.as_i64()), Some(0));
        assert_eq!(m.field("current_consumed").and_then(|v| v.as_i64()), Some(500));
        assert_eq!(m.field("gas_consumed").and_then(|v| v.as_i64()), Some(0));
        assert_eq!(m.tags.get("tarief").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_render_ends_with_checksum() {
        let text = render_telegram(&TelegramPacket::new("XMX5LG"));
        assert!(text.starts_with("/XMX5LG\r\n\r\n"));
        let bang = text.rfind('!').unwrap();
        assert_eq!(text.len() - bang, 7);
        assert!(text.contains("1-0:1.8.1(000000.000*kWh)\r\n"));
    }
}
