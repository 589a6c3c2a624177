use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::de as lenient;
use super::direction::Direction;
use super::ids::BacktestId;
use super::summary::Parameters;

/// Full payload for one backtest, as returned by `GET /backtest/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub id: BacktestId,
    #[serde(default)]
    pub strategy_name: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub summary_stats: SummaryStats,
    #[serde(default)]
    pub equity_data: Vec<EquityPoint>,
    #[serde(default)]
    pub price_data: Vec<PricePoint>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

impl Backtest {
    /// Ticker symbols present in the price data, in first-occurrence order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.price_data {
            if !seen.contains(&p.symbol.as_str()) {
                seen.push(&p.symbol);
            }
        }
        seen
    }

    /// Title used on tabs and headers.
    pub fn title(&self) -> String {
        match &self.strategy_name {
            Some(name) => format!("{name} #{}", self.id),
            None => format!("Backtest {}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::number")]
    pub equity_value: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub percent_return: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub percent_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(alias = "ticker")]
    pub symbol: String,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::number")]
    pub close: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "lenient::text_id")]
    pub trade_id: String,
    #[serde(deserialize_with = "lenient::text_id")]
    pub leg_id: String,
    pub symbol: String,
    #[serde(deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub cost: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub trade_instructions: Vec<TradeInstruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInstruction {
    #[serde(deserialize_with = "lenient::text_id")]
    pub leg_id: String,
    pub ticker: String,
    pub direction: Direction,
    #[serde(deserialize_with = "lenient::number")]
    pub allocation_percent: f64,
    #[serde(default, deserialize_with = "lenient::opt_text_id")]
    pub trade_id: Option<String>,
}

/// A single summary metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Missing,
}

impl MetricValue {
    /// Numeric view; decimal strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            MetricValue::Missing => "-".to_string(),
            MetricValue::Flag(b) => b.to_string(),
            MetricValue::Number(n) => format!("{n:.2}"),
            MetricValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => format!("{n:.2}"),
                Err(_) => s.clone(),
            },
        }
    }
}

/// Metric name to value, in the order the backend emitted them.
///
/// The serializer nests stats as `summary_stats: [{...}]` (one row per
/// backtest), while hand-written payloads use a flat object. Both decode to
/// the same ordered list; array rows are concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats(Vec<(String, MetricValue)>);

impl SummaryStats {
    pub fn new(entries: Vec<(String, MetricValue)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(MetricValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SummaryStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct StatsVisitor;

impl<'de> Visitor<'de> for StatsVisitor {
    type Value = SummaryStats;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("summary stats as an object or an array of objects")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SummaryStats::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(SummaryStats::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, MetricValue>()? {
            entries.push((key, value));
        }
        Ok(SummaryStats(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some(row) = access.next_element::<SummaryStats>()? {
            entries.extend(row.0);
        }
        Ok(SummaryStats(entries))
    }
}

impl<'de> Deserialize<'de> for SummaryStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StatsVisitor)
    }
}
