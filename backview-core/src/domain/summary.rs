use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de;
use super::ids::BacktestId;

/// Strategy parameters as stored by the backend.
///
/// The model keeps them in a text column, so they arrive either as a JSON
/// object or as a string that usually (but not always) contains one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(pub Value);

impl Parameters {
    /// Structured view, decoding a JSON-encoded string when needed.
    pub fn as_object(&self) -> Option<serde_json::Map<String, Value>> {
        match &self.0 {
            Value::Object(map) => Some(map.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }

    /// One-line rendering for headers and table cells.
    pub fn display(&self) -> String {
        match &self.0 {
            Value::Null => String::new(),
            Value::String(s) => match self.as_object() {
                Some(map) => render_map(&map),
                None => s.clone(),
            },
            Value::Object(map) => render_map(map),
            other => other.to_string(),
        }
    }
}

fn render_map(map: &serde_json::Map<String, Value>) -> String {
    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Listing row for one stored backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: BacktestId,
    pub strategy_name: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub capital: Option<f64>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl Summary {
    /// Date range formatted as `YYYY-MM-DD → YYYY-MM-DD`, or `-` when unknown.
    pub fn period(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => format!("{} → {}", s.format("%Y-%m-%d"), e.format("%Y-%m-%d")),
            (Some(s), None) => format!("{} →", s.format("%Y-%m-%d")),
            _ => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_endpoint_row_deserializes() {
        let s: Summary = serde_json::from_str(
            r#"{"id": 3, "strategy_name": "ZScore", "parameters": "{\"window\": 20}"}"#,
        )
        .unwrap();
        assert_eq!(s.id, BacktestId::new(3));
        assert!(s.symbols.is_empty());
        assert_eq!(s.parameters.display(), "window=20");
        assert_eq!(s.period(), "-");
    }

    #[test]
    fn full_row_deserializes() {
        let s: Summary = serde_json::from_str(
            r#"{"id": "9", "strategy_name": "Pairs", "parameters": {"lookback": 5, "mode": "fast"},
                "created_at": "2024-05-01T12:00:00Z", "start_date": "2023-01-01",
                "end_date": "2023-12-31", "capital": "100000.00", "symbols": ["HE.n.0", "ZC.n.0"]}"#,
        )
        .unwrap();
        assert_eq!(s.id.get(), 9);
        assert_eq!(s.capital, Some(100_000.0));
        assert_eq!(s.symbols, vec!["HE.n.0", "ZC.n.0"]);
        assert_eq!(s.period(), "2023-01-01 → 2023-12-31");
        assert_eq!(s.parameters.display(), "lookback=5, mode=fast");
    }

    #[test]
    fn plain_string_parameters_kept_verbatim() {
        let p = Parameters(Value::String("alpha 0.5".into()));
        assert!(p.as_object().is_none());
        assert_eq!(p.display(), "alpha 0.5");
    }
}
