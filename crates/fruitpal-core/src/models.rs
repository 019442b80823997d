use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::FruitpalError;

/// One trade offer: what a country charges on top of the market price for a
/// commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Traded fruit, stored exactly as the source wrote it.
    pub commodity: String,
    /// Origin or trading-partner code.
    pub country: String,
    /// Flat per-transaction charge.
    pub fixed_overhead: f64,
    /// Per-ton charge added to the price before scaling by volume.
    pub variable_overhead: f64,
}

impl TradeRecord {
    pub fn new(
        commodity: impl Into<String>,
        country: impl Into<String>,
        fixed_overhead: f64,
        variable_overhead: f64,
    ) -> Self {
        Self {
            commodity: commodity.into(),
            country: country.into(),
            fixed_overhead,
            variable_overhead,
        }
    }

    /// Case-insensitive exact match against the record's commodity.
    pub fn matches_commodity(&self, commodity: &str) -> bool {
        self.commodity.to_lowercase() == commodity.to_lowercase()
    }
}

/// A scalar carried through from a raw structured entry.
///
/// Only strings, numbers and booleans are kept as-is; anything else is
/// stringified by the decoder before it reaches this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Field name → value bag for one commodity/country pair.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Field names used by the structured format.
pub mod fields {
    pub const COUNTRY: &str = "COUNTRY";
    pub const COMMODITY: &str = "COMMODITY";
    pub const FIXED_OVERHEAD: &str = "FIXED_OVERHEAD";
    pub const VARIABLE_OVERHEAD: &str = "VARIABLE_OVERHEAD";

    /// Required fields in the order they are checked.
    pub const REQUIRED: [&str; 4] = [COUNTRY, COMMODITY, FIXED_OVERHEAD, VARIABLE_OVERHEAD];
}

/// Which parser to run over an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Decide from the file contents.
    #[default]
    Auto,
    /// List-of-records JSON.
    Json,
    /// Fixed-column text, one record per line.
    Flat,
}

impl FromStr for InputFormat {
    type Err = FruitpalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "json" => Ok(InputFormat::Json),
            "flat" => Ok(InputFormat::Flat),
            other => Err(FruitpalError::Config(format!(
                "unknown input format {other:?} (expected auto, json or flat)"
            ))),
        }
    }
}

/// One row of a cost query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub country: String,
    pub total_cost: f64,
    pub price_per_ton: f64,
    pub variable_overhead: f64,
    pub trade_volume: f64,
    pub fixed_overhead: f64,
}
