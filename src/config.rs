//! # Input Configuration
//!
//! One configuration struct per input. Defaults match a typical Raspberry Pi
//! installation: DHT22 on GPIO 22, water meter sensor on GPIO 17 and the P1
//! cable on the first USB serial adapter.

use crate::error::MeterError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// DHT22 humidity/temperature sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dht22Config {
    /// BCM pin number of the data line
    pub pin: u8,
    /// Time between start pulses
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
}

impl Default for Dht22Config {
    fn default() -> Self {
        Dht22Config {
            pin: 22,
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl Dht22Config {
    pub fn validate(&self) -> Result<(), MeterError> {
        validate_pin(self.pin)?;
        // The sensor needs two seconds between conversions
        if self.poll_interval < Duration::from_secs(2) {
            return Err(MeterError::Config(format!(
                "poll interval {:?} is shorter than 2s",
                self.poll_interval
            )));
        }
        Ok(())
    }
}

/// Pulse-output water meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermeterConfig {
    /// BCM pin number of the pulse sensor
    pub pin: u8,
}

impl Default for WatermeterConfig {
    fn default() -> Self {
        WatermeterConfig { pin: 17 }
    }
}

impl WatermeterConfig {
    pub fn validate(&self) -> Result<(), MeterError> {
        validate_pin(self.pin)
    }
}

/// DSMR P1 smart meter port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct P1Config {
    /// Serial device path
    pub port: String,
    /// Baud rate (115200 for DSMR 4+, 9600 for older meters)
    pub baud: u32,
}

impl Default for P1Config {
    fn default() -> Self {
        P1Config {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
        }
    }
}

impl P1Config {
    pub fn validate(&self) -> Result<(), MeterError> {
        if self.port.trim().is_empty() {
            return Err(MeterError::Config("serial port path is empty".into()));
        }
        if self.baud == 0 {
            return Err(MeterError::Config("baud rate must be positive".into()));
        }
        Ok(())
    }
}

fn validate_pin(pin: u8) -> Result<(), MeterError> {
    if pin > 27 {
        return Err(MeterError::Config(format!("GPIO {pin} is not a BCM user pin")));
    }
    Ok(())
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Dht22Config::default().validate().is_ok());
        assert!(WatermeterConfig::default().validate().is_ok());
        assert!(P1Config::default().validate().is_ok());
        assert_eq!(P1Config::default().baud, 115_200);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: Dht22Config = serde_json::from_str(r#"{"poll_interval": 30}"#).unwrap();
        assert_eq!(cfg.pin, 22);
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));

        let cfg: P1Config = serde_json::from_str(r#"{"port": "/dev/ttyAMA0"}"#).unwrap();
        assert_eq!(cfg.port, "/dev/ttyAMA0");
        assert_eq!(cfg.baud, 115_200);
    }

    #[test]
    fn test_invalid_values() {
        assert!(WatermeterConfig { pin: 40 }.validate().is_err());
        let fast = Dht22Config {
            poll_interval: Duration::from_millis(500),
            ..Default::default()
        };
        assert!(matches!(fast.validate(), Err(MeterError::Config(_))));
        let empty = P1Config {
            port: " ".into(),
            baud: 9600,
        };
        assert!(empty.validate().is_err());
    }
}
