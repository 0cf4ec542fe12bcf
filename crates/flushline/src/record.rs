//! JSON record to row mapping
//!
//! Each input line is one JSON object. Its keys are matched to columns
//! through `[source.fields]`; a column without a mapping is fed by the key of
//! the same name. Keys that feed no column are skipped, and a value the
//! column's type rejects leaves that column at its default.

use std::collections::HashMap;

use flushline_config::SourceConfig;
use flushline_schema::{Row, SchemaError, Table, Value};
use serde_json::Map;

/// Outcome of parsing one input line
#[derive(Debug)]
pub enum ParsedLine {
    /// Whitespace only
    Blank,
    /// A JSON object
    Record(Map<String, serde_json::Value>),
}

/// Why a line could not be turned into a record
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON that is not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Parse one JSONL line
pub fn parse_line(line: &str) -> Result<ParsedLine, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ParsedLine::Blank);
    }

    match serde_json::from_str(line)? {
        serde_json::Value::Object(map) => Ok(ParsedLine::Record(map)),
        other => Err(LineError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// What happened to the fields of one record
#[derive(Debug, Default)]
pub struct Mapped {
    /// Fields written into the row
    pub applied: usize,
    /// Keys that feed no column
    pub unknown_keys: usize,
    /// Values the column type rejected
    pub rejected: Vec<SchemaError>,
}

/// Maps record keys onto the columns of one table
#[derive(Debug)]
pub struct RecordMapper {
    /// Record key to the columns it feeds
    columns_by_key: HashMap<String, Vec<String>>,
}

impl RecordMapper {
    pub fn new(table: &Table, source: &SourceConfig) -> Self {
        let mut columns_by_key: HashMap<String, Vec<String>> = HashMap::new();
        for column in table.columns() {
            columns_by_key
                .entry(source.key_for(&column.name).to_owned())
                .or_default()
                .push(column.name.clone());
        }

        Self { columns_by_key }
    }

    /// Mappings in `[source.fields]` naming a column the table does not have
    pub fn unused_mappings<'a>(table: &Table, source: &'a SourceConfig) -> Vec<&'a str> {
        source
            .fields
            .keys()
            .filter(|column| table.column(column).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Columns fed by a record key
    pub fn columns_for(&self, key: &str) -> &[String] {
        self.columns_by_key.get(key).map_or(&[], Vec::as_slice)
    }

    /// Write the fields of `record` into `row`
    pub fn apply(&self, row: &mut Row, record: Map<String, serde_json::Value>) -> Mapped {
        let mut mapped = Mapped::default();

        for (key, value) in record {
            let Some(columns) = self.columns_by_key.get(&key) else {
                mapped.unknown_keys += 1;
                continue;
            };

            let value = Value::from(value);
            for column in columns {
                match row.set(column, value.clone()) {
                    Ok(()) => mapped.applied += 1,
                    Err(e) => mapped.rejected.push(e),
                }
            }
        }

        mapped
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
