//! Commodity/country aggregation of parsed trade data.
//!
//! Builds an [`AggregateSnapshot`]: a commodity → country → attribute lookup
//! plus the distinct country and commodity sets used for enumeration.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fruitpal_core::error::{FruitpalError, Result};
use fruitpal_core::models::{AttributeMap, TradeRecord};
use serde::Serialize;

use crate::reader::StructuredEntry;

// ── AggregateSnapshot ─────────────────────────────────────────────────────────

/// Immutable aggregate view of one parsed data file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateSnapshot {
    /// commodity → country → every other field of the source entry.
    pub by_commodity: BTreeMap<String, BTreeMap<String, AttributeMap>>,
    /// Distinct countries, as stored in the source.
    pub countries: BTreeSet<String>,
    /// Distinct commodities, as stored in the source.
    pub commodities: BTreeSet<String>,
    /// Number of source entries folded into this snapshot.
    pub record_count: usize,
    /// When the snapshot was built.
    pub built_at: DateTime<Utc>,
}

impl AggregateSnapshot {
    /// `true` when no entries were aggregated.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Attribute map for an exact commodity/country pair.
    pub fn attributes(&self, commodity: &str, country: &str) -> Option<&AttributeMap> {
        self.by_commodity.get(commodity)?.get(country)
    }
}

// ── ListKey ───────────────────────────────────────────────────────────────────

/// Which distinct-value set to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKey {
    Commodity,
    Country,
}

impl ListKey {
    /// Every accepted key, in display order.
    pub const VALID: [&'static str; 2] = ["commodity", "country"];

    pub fn as_str(self) -> &'static str {
        match self {
            ListKey::Commodity => "commodity",
            ListKey::Country => "country",
        }
    }
}

impl FromStr for ListKey {
    type Err = FruitpalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "commodity" => Ok(ListKey::Commodity),
            "country" => Ok(ListKey::Country),
            other => Err(FruitpalError::UnknownKey {
                key: other.to_string(),
                valid: Self::VALID.iter().map(|k| k.to_string()).collect(),
            }),
        }
    }
}

// ── TradeAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that folds parsed entries into a snapshot.
pub struct TradeAggregator;

impl TradeAggregator {
    /// Build a snapshot in a single pass over `entries`.
    ///
    /// Repeated commodity/country pairs merge their attribute maps; later
    /// entries overwrite earlier values for the same field.
    pub fn aggregate(entries: &[StructuredEntry]) -> AggregateSnapshot {
        let mut snapshot = AggregateSnapshot {
            built_at: Utc::now(),
            ..AggregateSnapshot::default()
        };

        for entry in entries {
            let record = &entry.record;
            snapshot
                .by_commodity
                .entry(record.commodity.clone())
                .or_default()
                .entry(record.country.clone())
                .or_default()
                .extend(entry.attributes.clone());

            snapshot.countries.insert(record.country.clone());
            snapshot.commodities.insert(record.commodity.clone());
        }
        snapshot.record_count = entries.len();

        tracing::debug!(
            records = snapshot.record_count,
            commodities = snapshot.commodities.len(),
            countries = snapshot.countries.len(),
            "aggregated trade data"
        );
        snapshot
    }

    /// Aggregate bare records; attributes are the two overhead values.
    pub fn aggregate_records(records: &[TradeRecord]) -> AggregateSnapshot {
        let entries: Vec<StructuredEntry> =
            records.iter().cloned().map(StructuredEntry::from).collect();
        Self::aggregate(&entries)
    }

    /// Sorted distinct values for `key` (`"commodity"` or `"country"`,
    /// case-insensitive).
    pub fn list_values(snapshot: &AggregateSnapshot, key: &str) -> Result<Vec<String>> {
        let key: ListKey = key.parse()?;
        Ok(Self::values_for(snapshot, key))
    }

    /// Sorted distinct values for an already-validated key.
    pub fn values_for(snapshot: &AggregateSnapshot, key: ListKey) -> Vec<String> {
        let set = match key {
            ListKey::Commodity => &snapshot.commodities,
            ListKey::Country => &snapshot.countries,
        };
        // BTreeSet iterates in ascending byte order.
        set.iter().cloned().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_structured;
    use fruitpal_core::error::ErrorKind;
    use fruitpal_core::models::AttributeValue;

    fn extended_records() -> Vec<TradeRecord> {
        vec![
            TradeRecord::new("mango", "MX", 32.0, 1.24),
            TradeRecord::new("mango", "BR", 20.0, 1.42),
            TradeRecord::new("pineapple", "PH", 4.0, 0.95),
            TradeRecord::new("banana", "MY", 5.0, 1.01),
            TradeRecord::new("apple", "US", 50.0, 1.75),
            TradeRecord::new("orange", "FR", 10.0, 2.24),
            TradeRecord::new("mango", "US", 50.0, 1.75),
        ]
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_nested_lookup() {
        let snapshot = TradeAggregator::aggregate_records(&extended_records());
        assert_eq!(snapshot.record_count, 7);
        assert_eq!(snapshot.by_commodity["mango"].len(), 3);

        let mx = snapshot.attributes("mango", "MX").unwrap();
        assert_eq!(mx["FIXED_OVERHEAD"], AttributeValue::Number(32.0));
        assert_eq!(mx["VARIABLE_OVERHEAD"], AttributeValue::Number(1.24));
        assert!(snapshot.attributes("mango", "PH").is_none());
        assert!(snapshot.attributes("kiwi", "MX").is_none());
    }

    #[test]
    fn test_aggregate_keeps_extension_fields() {
        let input = serde_json::json!([
            {"COUNTRY": "MX", "COMMODITY": "mango", "FIXED_OVERHEAD": 32,
             "VARIABLE_OVERHEAD": 1.24, "SEASON": "summer"}
        ])
        .to_string();
        let entries = decode_structured(input.as_bytes()).unwrap();
        let snapshot = TradeAggregator::aggregate(&entries);

        let attrs = snapshot.attributes("mango", "MX").unwrap();
        assert_eq!(attrs["SEASON"], AttributeValue::Text("summer".into()));
        assert!(!attrs.contains_key("COUNTRY"));
        assert!(!attrs.contains_key("COMMODITY"));
    }

    #[test]
    fn test_aggregate_duplicate_pair_merges_later_wins() {
        let input = serde_json::json!([
            {"COUNTRY": "MX", "COMMODITY": "mango", "FIXED_OVERHEAD": 32,
             "VARIABLE_OVERHEAD": 1.24, "GRADE": "B"},
            {"COUNTRY": "MX", "COMMODITY": "mango", "FIXED_OVERHEAD": 30,
             "VARIABLE_OVERHEAD": 1.24}
        ])
        .to_string();
        let entries = decode_structured(input.as_bytes()).unwrap();
        let snapshot = TradeAggregator::aggregate(&entries);

        let attrs = snapshot.attributes("mango", "MX").unwrap();
        assert_eq!(attrs["FIXED_OVERHEAD"], AttributeValue::Number(30.0));
        assert_eq!(attrs["GRADE"], AttributeValue::Text("B".into()));
        assert_eq!(snapshot.record_count, 2);
    }

    #[test]
    fn test_aggregate_empty() {
        let snapshot = TradeAggregator::aggregate(&[]);
        assert!(snapshot.is_empty());
        assert!(snapshot.by_commodity.is_empty());
        assert!(snapshot.countries.is_empty());
    }

    // ── list_values ───────────────────────────────────────────────────────────

    #[test]
    fn test_list_values_commodity_sorted_distinct() {
        let snapshot = TradeAggregator::aggregate_records(&extended_records());
        let values = TradeAggregator::list_values(&snapshot, "commodity").unwrap();
        assert_eq!(
            values,
            vec!["apple", "banana", "mango", "orange", "pineapple"]
        );
    }

    #[test]
    fn test_list_values_country_sorted_distinct() {
        let snapshot = TradeAggregator::aggregate_records(&extended_records());
        let values = TradeAggregator::list_values(&snapshot, "COUNTRY").unwrap();
        assert_eq!(values, vec!["BR", "FR", "MX", "MY", "PH", "US"]);
    }

    #[test]
    fn test_list_values_round_trips_distinct_commodities() {
        let records = extended_records();
        let snapshot = TradeAggregator::aggregate_records(&records);

        let mut expected: Vec<String> = records.iter().map(|r| r.commodity.clone()).collect();
        expected.sort();
        expected.dedup();
        assert_eq!(
            TradeAggregator::list_values(&snapshot, "commodity").unwrap(),
            expected
        );
    }

    #[test]
    fn test_list_values_preserves_stored_case() {
        let records = vec![
            TradeRecord::new("Mango", "mx", 1.0, 1.0),
            TradeRecord::new("apple", "BR", 1.0, 1.0),
        ];
        let snapshot = TradeAggregator::aggregate_records(&records);
        assert_eq!(
            TradeAggregator::list_values(&snapshot, "commodity").unwrap(),
            vec!["Mango", "apple"]
        );
        assert_eq!(
            TradeAggregator::list_values(&snapshot, "country").unwrap(),
            vec!["BR", "mx"]
        );
    }

    #[test]
    fn test_list_values_invalid_key() {
        let snapshot = TradeAggregator::aggregate_records(&extended_records());
        let err = TradeAggregator::list_values(&snapshot, "weight").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        match err {
            FruitpalError::UnknownKey { key, valid } => {
                assert_eq!(key, "weight");
                assert_eq!(valid, vec!["commodity", "country"]);
            }
            other => panic!("expected UnknownKey, got {other:?}"),
        }
    }

    #[test]
    fn test_list_key_round_trip() {
        for name in ListKey::VALID {
            let key: ListKey = name.parse().unwrap();
            assert_eq!(key.as_str(), name);
        }
    }
}
