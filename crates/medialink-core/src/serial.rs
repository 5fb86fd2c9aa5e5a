//! Serial line settings shared by serial-port based media.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MediaError, Result};
use crate::text::textual_enum;

/// Standard serial baud rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum BaudRate {
    Baud50 = 50,
    Baud75 = 75,
    Baud110 = 110,
    Baud134 = 134,
    Baud150 = 150,
    Baud200 = 200,
    Baud300 = 300,
    Baud600 = 600,
    Baud1200 = 1200,
    Baud1800 = 1800,
    Baud2400 = 2400,
    Baud4800 = 4800,
    Baud9600 = 9600,
    Baud19200 = 19200,
    Baud38400 = 38400,
    Baud57600 = 57600,
    Baud115200 = 115200,
    Baud230400 = 230400,
    Baud460800 = 460800,
    Baud921600 = 921600,
}

impl BaudRate {
    pub const ALL: &'static [BaudRate] = &[
        BaudRate::Baud50,
        BaudRate::Baud75,
        BaudRate::Baud110,
        BaudRate::Baud134,
        BaudRate::Baud150,
        BaudRate::Baud200,
        BaudRate::Baud300,
        BaudRate::Baud600,
        BaudRate::Baud1200,
        BaudRate::Baud1800,
        BaudRate::Baud2400,
        BaudRate::Baud4800,
        BaudRate::Baud9600,
        BaudRate::Baud19200,
        BaudRate::Baud38400,
        BaudRate::Baud57600,
        BaudRate::Baud115200,
        BaudRate::Baud230400,
        BaudRate::Baud460800,
        BaudRate::Baud921600,
    ];

    /// Bits per second.
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::Baud9600
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = MediaError;

    fn try_from(value: u32) -> Result<Self> {
        BaudRate::ALL
            .iter()
            .copied()
            .find(|rate| rate.as_u32() == value)
            .ok_or(MediaError::ArgumentOutOfRange {
                name: "baud_rate",
                value: i64::from(value),
            })
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl FromStr for BaudRate {
    type Err = MediaError;

    fn from_str(value: &str) -> Result<Self> {
        let text = value.trim();
        BaudRate::ALL
            .iter()
            .copied()
            .find(|rate| rate.to_string() == text)
            .ok_or_else(|| MediaError::UnknownEnum(text.to_string()))
    }
}

impl Serialize for BaudRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

impl<'de> Deserialize<'de> for BaudRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = u32::deserialize(deserializer)?;
        BaudRate::try_from(value).map_err(serde::de::Error::custom)
    }
}

textual_enum! {
    /// Parity checking scheme.
    pub enum Parity {
        None => "None",
        Odd => "Odd",
        Even => "Even",
        /// Parity bit always 1.
        Mark => "Mark",
        /// Parity bit always 0.
        Space => "Space",
    }
}

impl Default for Parity {
    fn default() -> Self {
        Parity::None
    }
}

textual_enum! {
    /// Number of stop bits per character.
    pub enum StopBits {
        None => "None",
        One => "One",
        Two => "Two",
        OnePointFive => "OnePointFive",
    }
}

impl Default for StopBits {
    fn default() -> Self {
        StopBits::One
    }
}

/// Line settings for a serial media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerialSettings {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: BaudRate,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: BaudRate::default(),
            data_bits: 8,
            parity: Parity::default(),
            stop_bits: StopBits::default(),
        }
    }
}

impl SerialSettings {
    /// Check the settings are usable for opening a port.
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(MediaError::invalid("serial port name is empty"));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(MediaError::ArgumentOutOfRange {
                name: "data_bits",
                value: i64::from(self.data_bits),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn baud_rate_text() {
        assert_eq!("9600".parse::<BaudRate>().unwrap(), BaudRate::Baud9600);
        assert_eq!(" 921600".parse::<BaudRate>().unwrap(), BaudRate::Baud921600);
        assert_eq!(BaudRate::Baud50.to_string(), "50");
        assert_eq!(
            "9601".parse::<BaudRate>().unwrap_err().kind(),
            ErrorKind::UnknownEnum
        );
        assert_eq!(BaudRate::ALL.len(), 20);
    }

    #[test]
    fn baud_rate_numeric_conversion() {
        assert_eq!(BaudRate::try_from(115_200).unwrap(), BaudRate::Baud115200);
        assert_eq!(
            BaudRate::try_from(12).unwrap_err().kind(),
            ErrorKind::ArgumentOutOfRange
        );
    }

    #[test]
    fn parity_and_stop_bits_text() {
        assert_eq!("even".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("SPACE".parse::<Parity>().unwrap(), Parity::Space);
        assert_eq!(Parity::Mark.to_string(), "Mark");
        assert_eq!(
            "onepointfive".parse::<StopBits>().unwrap(),
            StopBits::OnePointFive
        );
        assert_eq!(StopBits::Two.to_string(), "Two");
        assert!("1.5".parse::<StopBits>().is_err());
    }

    #[test]
    fn settings_json() {
        let json = r#"{"port":"/dev/ttyUSB0","baudRate":2400,"parity":"even","stopBits":"One"}"#;
        let settings: SerialSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.baud_rate, BaudRate::Baud2400);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.data_bits, 8);
        settings.validate().unwrap();

        assert!(serde_json::from_str::<SerialSettings>(r#"{"baudRate":2401}"#).is_err());
    }

    #[test]
    fn settings_validation() {
        let mut settings = SerialSettings {
            port: "COM3".into(),
            ..SerialSettings::default()
        };
        settings.data_bits = 9;
        assert_eq!(
            settings.validate().unwrap_err().kind(),
            ErrorKind::ArgumentOutOfRange
        );
        settings.port.clear();
        assert_eq!(
            settings.validate().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }
}
