use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Trade / instruction direction as emitted by the strategy engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
    Sell,
    Cover,
    Other(String),
}

impl Direction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LONG" => Direction::Long,
            "SHORT" => Direction::Short,
            "SELL" => Direction::Sell,
            "COVER" => Direction::Cover,
            _ => Direction::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Sell => "SELL",
            Direction::Cover => "COVER",
            Direction::Other(s) => s,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Direction::parse(&raw))
    }
}
