//! Trade data parsing and file loading for Fruitpal.
//!
//! Two input formats produce the same canonical [`TradeRecord`] list:
//! a JSON list of records with `COUNTRY`, `COMMODITY`, `FIXED_OVERHEAD` and
//! `VARIABLE_OVERHEAD` fields, and a flat text file with one
//! `COMMODITY COUNTRY FIXED VARIABLE` record per line. Both parsers stop at
//! the first error and never return partial results.

use std::io::BufRead;
use std::path::Path;

use fruitpal_core::error::{FruitpalError, Position, Result};
use fruitpal_core::models::{fields, AttributeMap, AttributeValue, InputFormat, TradeRecord};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Anchored whole-line grammar of the flat format.
const FLAT_RECORD_PATTERN: &str = r"(?x)
    ^
    ([A-Za-z]+)                 # commodity
    \s+
    ([A-Za-z]{2})               # two-letter country code
    \s+
    ([0-9]*\.[0-9]+|[0-9]+)     # fixed overhead
    \s+
    ([0-9]*\.[0-9]+|[0-9]+)     # variable overhead
    $";

/// Longest fragment quoted back in a malformed-input error.
const MAX_FRAGMENT_CHARS: usize = 60;

// ── StructuredEntry ───────────────────────────────────────────────────────────

/// A decoded structured record together with every field it carried other
/// than country and commodity.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredEntry {
    pub record: TradeRecord,
    pub attributes: AttributeMap,
}

impl From<TradeRecord> for StructuredEntry {
    fn from(record: TradeRecord) -> Self {
        let mut attributes = AttributeMap::new();
        attributes.insert(
            fields::FIXED_OVERHEAD.to_string(),
            AttributeValue::Number(record.fixed_overhead),
        );
        attributes.insert(
            fields::VARIABLE_OVERHEAD.to_string(),
            AttributeValue::Number(record.variable_overhead),
        );
        Self { record, attributes }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a structured (JSON list-of-records) document into trade records.
pub fn parse_structured(bytes: &[u8]) -> Result<Vec<TradeRecord>> {
    Ok(decode_structured(bytes)?
        .into_iter()
        .map(|entry| entry.record)
        .collect())
}

/// Decode a structured document, keeping the pass-through attributes of
/// every entry.
pub fn decode_structured(bytes: &[u8]) -> Result<Vec<StructuredEntry>> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| syntax_error(bytes, &e))?;

    let Value::Array(items) = document else {
        return Err(FruitpalError::MalformedInput {
            position: Position::Line {
                line: 1,
                column: None,
            },
            fragment: truncate(String::from_utf8_lossy(bytes).trim()),
            reason: "expected a list of records".to_string(),
        });
    };

    let entries = items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_entry(index, item))
        .collect::<Result<Vec<_>>>()?;

    debug!(records = entries.len(), "decoded structured input");
    Ok(entries)
}

/// Parse the flat line format from any buffered reader.
pub fn parse_flat_file<R: BufRead>(reader: R) -> Result<Vec<TradeRecord>> {
    let pattern = Regex::new(FLAT_RECORD_PATTERN).expect("flat record pattern is valid");
    let mut records = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line_result.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => FruitpalError::MalformedInput {
                position: Position::Line {
                    line: line_no,
                    column: None,
                },
                fragment: String::new(),
                reason: "line is not valid UTF-8".to_string(),
            },
            _ => FruitpalError::Io(e),
        })?;
        let text = line.strip_suffix('\r').unwrap_or(&line);

        let caps = pattern.captures(text).ok_or_else(|| {
            malformed_line(line_no, text, "line does not match `COMMODITY CC FIXED VARIABLE`")
        })?;

        let fixed_overhead = parse_decimal(&caps[3], line_no, text)?;
        let variable_overhead = parse_decimal(&caps[4], line_no, text)?;
        records.push(TradeRecord::new(
            &caps[1],
            &caps[2],
            fixed_overhead,
            variable_overhead,
        ));
    }

    debug!(records = records.len(), "parsed flat input");
    Ok(records)
}

/// Pick a concrete format for `bytes`: a leading `[` or `{` means JSON,
/// anything else is treated as the flat format.
pub fn detect_format(bytes: &[u8]) -> InputFormat {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') | Some(b'{') => InputFormat::Json,
        _ => InputFormat::Flat,
    }
}

/// Read `path` and decode it into structured entries.
///
/// Flat files yield entries whose attributes are the two overhead values.
/// Under [`InputFormat::Auto`] a blank file is malformed, since neither
/// format can be recognised.
pub fn load_entries(path: &Path, format: InputFormat) -> Result<Vec<StructuredEntry>> {
    let bytes = std::fs::read(path).map_err(|source| FruitpalError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let resolved = match format {
        InputFormat::Auto if bytes.iter().all(u8::is_ascii_whitespace) => {
            return Err(malformed_line(1, "", "input is empty"));
        }
        InputFormat::Auto => detect_format(&bytes),
        other => other,
    };
    debug!(path = %path.display(), format = ?resolved, "loading trade data");

    match resolved {
        InputFormat::Flat => Ok(parse_flat_file(bytes.as_slice())?
            .into_iter()
            .map(StructuredEntry::from)
            .collect()),
        _ => decode_structured(&bytes),
    }
}

/// Read `path` and parse it into trade records.
pub fn load_records(path: &Path, format: InputFormat) -> Result<Vec<TradeRecord>> {
    Ok(load_entries(path, format)?
        .into_iter()
        .map(|entry| entry.record)
        .collect())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn decode_entry(index: usize, item: &Value) -> Result<StructuredEntry> {
    let Value::Object(map) = item else {
        return Err(malformed_record(index, item, "expected an object"));
    };

    for field in fields::REQUIRED {
        if !map.contains_key(field) {
            return Err(FruitpalError::MissingField {
                field: field.to_string(),
                index,
            });
        }
    }

    let country = text_field(index, item, fields::COUNTRY)?;
    let commodity = text_field(index, item, fields::COMMODITY)?;
    let fixed_overhead = numeric_field(index, item, fields::FIXED_OVERHEAD)?;
    let variable_overhead = numeric_field(index, item, fields::VARIABLE_OVERHEAD)?;

    let attributes = map
        .iter()
        .filter(|(key, _)| key.as_str() != fields::COUNTRY && key.as_str() != fields::COMMODITY)
        .map(|(key, value)| (key.clone(), attribute_value(value)))
        .collect();

    Ok(StructuredEntry {
        record: TradeRecord::new(commodity, country, fixed_overhead, variable_overhead),
        attributes,
    })
}

fn text_field(index: usize, item: &Value, field: &str) -> Result<String> {
    item[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed_record(index, item, &format!("{field} must be a string")))
}

/// Numbers pass through; numeric strings are coerced. `NaN` and infinities
/// are not numeric.
fn numeric_field(index: usize, item: &Value, field: &str) -> Result<f64> {
    let coerced = match &item[field] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    coerced
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed_record(index, item, &format!("{field} is not numeric")))
}

fn attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => n
            .as_f64()
            .map(AttributeValue::Number)
            .unwrap_or_else(|| AttributeValue::Text(n.to_string())),
        Value::String(s) => AttributeValue::Text(s.clone()),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn parse_decimal(raw: &str, line_no: usize, text: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| malformed_line(line_no, text, &format!("invalid decimal {raw:?}: {e}")))
}

fn malformed_line(line_no: usize, text: &str, reason: &str) -> FruitpalError {
    FruitpalError::MalformedInput {
        position: Position::Line {
            line: line_no,
            column: None,
        },
        fragment: truncate(text),
        reason: reason.to_string(),
    }
}

fn malformed_record(index: usize, item: &Value, reason: &str) -> FruitpalError {
    FruitpalError::MalformedInput {
        position: Position::Record(index),
        fragment: truncate(&item.to_string()),
        reason: reason.to_string(),
    }
}

/// Map a decoder error to a malformed-input error quoting the offending line.
fn syntax_error(bytes: &[u8], err: &serde_json::Error) -> FruitpalError {
    let line = err.line().max(1);
    let column = (err.column() > 0).then_some(err.column());
    let text = String::from_utf8_lossy(bytes);
    let fragment = text.lines().nth(line - 1).unwrap_or_default().trim();

    let message = err.to_string();
    let reason = message
        .split(" at line ")
        .next()
        .unwrap_or(message.as_str())
        .to_string();

    FruitpalError::MalformedInput {
        position: Position::Line { line, column },
        fragment: truncate(fragment),
        reason,
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_FRAGMENT_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_FRAGMENT_CHARS).collect();
        format!("{head}...")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
