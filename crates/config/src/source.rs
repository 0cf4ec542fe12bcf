//! Record source configuration

use std::collections::BTreeMap;

use serde::Deserialize;

/// How input records map onto table columns
///
/// # Example
///
/// ```toml
/// [source.fields]
/// # column = "record key"
/// message_num = "p_num"
/// message_time = "p_time"
/// ```
///
/// Columns without an entry are filled from the record key of the same name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Column name to record key
    pub fields: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Record key that feeds `column`
    pub fn key_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.fields.get(column).map_or(column, String::as_str)
    }
}
