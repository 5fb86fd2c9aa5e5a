use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MediaError;
use crate::text::textual_enum;

textual_enum! {
    /// Verbosity threshold for media trace events.
    ///
    /// Levels are cumulative: each one includes the categories of the
    /// levels before it.
    #[derive(PartialOrd, Ord)]
    pub enum TraceLevel {
        Off => "OFF",
        Error => "ERROR",
        Warning => "WARNING",
        Info => "INFO",
        Verbose => "VERBOSE",
    }
}

impl Default for TraceLevel {
    fn default() -> Self {
        TraceLevel::Off
    }
}

impl TraceLevel {
    /// Trace categories this level lets through.
    ///
    /// Sent and received payload traces are only emitted at `Verbose`.
    pub fn categories(self) -> TraceTypes {
        match self {
            TraceLevel::Off => TraceTypes::NONE,
            TraceLevel::Error => TraceTypes::ERROR,
            TraceLevel::Warning => TraceTypes::ERROR | TraceTypes::WARNING,
            TraceLevel::Info => TraceTypes::ERROR | TraceTypes::WARNING | TraceTypes::INFO,
            TraceLevel::Verbose => TraceTypes::ALL,
        }
    }

    /// Whether an event of category `kind` passes this level.
    pub fn allows(self, kind: TraceTypes) -> bool {
        !kind.is_empty() && self.categories().contains(kind)
    }
}

/// Bitmask of trace categories.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceTypes(u8);

impl TraceTypes {
    pub const NONE: TraceTypes = TraceTypes(0);
    /// Data was sent.
    pub const SENT: TraceTypes = TraceTypes(0x01);
    /// Data was received.
    pub const RECEIVED: TraceTypes = TraceTypes(0x02);
    /// An error occurred.
    pub const ERROR: TraceTypes = TraceTypes(0x04);
    /// A warning was issued.
    pub const WARNING: TraceTypes = TraceTypes(0x08);
    /// Informational message, e.g. media state notifications.
    pub const INFO: TraceTypes = TraceTypes(0x10);
    pub const ALL: TraceTypes = TraceTypes(0x1F);

    const NAMED: [(TraceTypes, &'static str); 5] = [
        (TraceTypes::SENT, "SENT"),
        (TraceTypes::RECEIVED, "RECEIVED"),
        (TraceTypes::ERROR, "ERROR"),
        (TraceTypes::WARNING, "WARNING"),
        (TraceTypes::INFO, "INFO"),
    ];

    /// Single categories, in bit order.
    pub fn categories() -> impl Iterator<Item = TraceTypes> {
        Self::NAMED.into_iter().map(|(kind, _)| kind)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, ignoring unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        TraceTypes(bits & Self::ALL.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`.
    pub const fn contains(self, other: TraceTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TraceTypes {
    type Output = TraceTypes;

    fn bitor(self, rhs: Self) -> Self::Output {
        TraceTypes(self.0 | rhs.0)
    }
}

impl BitOrAssign for TraceTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TraceTypes {
    type Output = TraceTypes;

    fn bitand(self, rhs: Self) -> Self::Output {
        TraceTypes(self.0 & rhs.0)
    }
}

impl fmt::Display for TraceTypes {
    /// Named categories joined with `|`, e.g. `SENT|RECEIVED`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, name) in Self::NAMED {
            if self.contains(kind) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TraceTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceTypes({self})")
    }
}

impl FromStr for TraceTypes {
    type Err = MediaError;

    /// Parses one category name, or several joined with `|`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut mask = TraceTypes::NONE;
        for part in value.split('|') {
            let part = part.trim();
            let kind = Self::NAMED
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .map(|(kind, _)| *kind)
                .ok_or_else(|| MediaError::UnknownEnum(part.to_string()))?;
            mask |= kind;
        }
        Ok(mask)
    }
}

impl Serialize for TraceTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TraceTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Ok(TraceTypes::NONE);
        }
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_cumulative() {
        assert!(!TraceLevel::Off.allows(TraceTypes::ERROR));
        assert!(TraceLevel::Error.allows(TraceTypes::ERROR));
        assert!(!TraceLevel::Error.allows(TraceTypes::WARNING));
        assert!(TraceLevel::Warning.allows(TraceTypes::ERROR));
        assert!(TraceLevel::Warning.allows(TraceTypes::WARNING));
        assert!(TraceLevel::Info.allows(TraceTypes::INFO));
        assert!(!TraceLevel::Info.allows(TraceTypes::SENT));
        assert!(TraceLevel::Verbose.allows(TraceTypes::SENT));
        assert!(TraceLevel::Verbose.allows(TraceTypes::RECEIVED));
    }

    #[test]
    fn level_ordering_follows_verbosity() {
        assert!(TraceLevel::Off < TraceLevel::Error);
        assert!(TraceLevel::Info < TraceLevel::Verbose);
    }

    #[test]
    fn trace_level_text() {
        assert_eq!("verbose".parse::<TraceLevel>().unwrap(), TraceLevel::Verbose);
        assert_eq!(TraceLevel::Warning.to_string(), "WARNING");
        assert!("LOUD".parse::<TraceLevel>().is_err());
    }

    #[test]
    fn trace_types_text() {
        assert_eq!("sent".parse::<TraceTypes>().unwrap(), TraceTypes::SENT);
        assert_eq!(
            "Sent|error".parse::<TraceTypes>().unwrap(),
            TraceTypes::SENT | TraceTypes::ERROR
        );
        assert_eq!(TraceTypes::RECEIVED.to_string(), "RECEIVED");
        assert_eq!(TraceTypes::ALL.to_string(), "SENT|RECEIVED|ERROR|WARNING|INFO");
        assert!("DEBUG".parse::<TraceTypes>().is_err());
    }

    #[test]
    fn mask_operations() {
        let mask = TraceTypes::SENT | TraceTypes::INFO;
        assert!(mask.contains(TraceTypes::SENT));
        assert!(!mask.contains(TraceTypes::RECEIVED));
        assert_eq!(mask & TraceTypes::INFO, TraceTypes::INFO);
        assert_eq!(TraceTypes::from_bits_truncate(0xFF), TraceTypes::ALL);
        assert_eq!(TraceTypes::categories().count(), 5);
    }

    #[test]
    fn serde_uses_text() {
        let json = serde_json::to_string(&(TraceLevel::Info, TraceTypes::SENT | TraceTypes::ERROR))
            .unwrap();
        assert_eq!(json, r#"["INFO","SENT|ERROR"]"#);
        let back: (TraceLevel, TraceTypes) = serde_json::from_str(&json).unwrap();
        assert_eq!(back, (TraceLevel::Info, TraceTypes::SENT | TraceTypes::ERROR));
    }
}
