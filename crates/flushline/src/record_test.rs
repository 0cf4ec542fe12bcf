use std::sync::Arc;

use flushline_config::SourceConfig;
use flushline_schema::{SchemaError, Table};

use super::*;

fn messages_table() -> Arc<Table> {
    Arc::new(
        Table::from_type_names(
            "messages",
            "default",
            [
                ("message_num", "UInt32"),
                ("message", "String"),
                ("tags", "Array(String)"),
            ],
        )
        .unwrap(),
    )
}

fn source(fields: &[(&str, &str)]) -> SourceConfig {
    SourceConfig {
        fields: fields
            .iter()
            .map(|(c, k)| (c.to_string(), k.to_string()))
            .collect(),
    }
}

fn record(line: &str) -> Map<String, serde_json::Value> {
    match parse_line(line).unwrap() {
        ParsedLine::Record(map) => map,
        ParsedLine::Blank => panic!("blank line"),
    }
}

// =============================================================================
// Line parsing
// =============================================================================

#[test]
fn test_parse_blank_line() {
    assert!(matches!(parse_line("   \n"), Ok(ParsedLine::Blank)));
}

#[test]
fn test_parse_object() {
    let map = record("{\"message\": \"hello\", \"message_num\": 1}\n");
    assert_eq!(map.len(), 2);
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_line("{not json").unwrap_err();
    assert!(matches!(err, LineError::Json(_)));
    assert!(err.to_string().starts_with("invalid JSON"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_parse_non_object() {
    let err = parse_line("[1, 2]").unwrap_err();
    assert!(matches!(err, LineError::NotAnObject("an array")));
    assert_eq!(err.to_string(), "expected a JSON object, got an array");
}

// =============================================================================
// Mapping
// =============================================================================

#[test]
fn test_apply_same_name_keys() {
    let table = messages_table();
    let mapper = RecordMapper::new(&table, &SourceConfig::default());

    let mut row = table.default_row();
    let mapped = mapper.apply(
        &mut row,
        record(r#"{"message_num": 7, "message": "it's up", "tags": ["a", "b"]}"#),
    );

    assert_eq!(mapped.applied, 3);
    assert_eq!(mapped.unknown_keys, 0);
    assert!(mapped.rejected.is_empty());
    assert_eq!(row.get("message_num"), Some("7"));
    assert_eq!(row.get("message"), Some(r"'it\'s up'"));
    assert_eq!(row.get("tags"), Some("['a','b']"));
}

#[test]
fn test_apply_mapped_keys() {
    let table = messages_table();
    let mapper = RecordMapper::new(&table, &source(&[("message_num", "p_num")]));

    assert_eq!(mapper.columns_for("p_num"), ["message_num".to_string()]);
    assert!(mapper.columns_for("message_num").is_empty());

    let mut row = table.default_row();
    let mapped = mapper.apply(&mut row, record(r#"{"p_num": 42, "message_num": 1}"#));

    assert_eq!(mapped.applied, 1);
    assert_eq!(mapped.unknown_keys, 1);
    assert_eq!(row.get("message_num"), Some("42"));
}

#[test]
fn test_apply_one_key_feeds_two_columns() {
    let table = messages_table();
    let mapper = RecordMapper::new(&table, &source(&[("message_num", "message")]));

    let mut row = table.default_row();
    let mapped = mapper.apply(&mut row, record(r#"{"message": "12"}"#));

    assert_eq!(mapped.applied, 2);
    assert_eq!(row.get("message"), Some("'12'"));
    assert_eq!(row.get("message_num"), Some("12"));
}

#[test]
fn test_apply_unknown_keys_are_counted() {
    let table = messages_table();
    let mapper = RecordMapper::new(&table, &SourceConfig::default());

    let mut row = table.default_row();
    let mapped = mapper.apply(&mut row, record(r#"{"host": "a", "pid": 3}"#));

    assert_eq!(mapped.applied, 0);
    assert_eq!(mapped.unknown_keys, 2);
    assert_eq!(row, table.default_row());
}

#[test]
fn test_apply_rejected_value_keeps_default() {
    let table = messages_table();
    let mapper = RecordMapper::new(&table, &SourceConfig::default());

    let mut row = table.default_row();
    let mapped = mapper.apply(
        &mut row,
        record(r#"{"message_num": "many", "message": "kept"}"#),
    );

    assert_eq!(mapped.applied, 1);
    assert_eq!(mapped.rejected.len(), 1);
    assert!(matches!(
        &mapped.rejected[0],
        SchemaError::Conversion { column, .. } if column == "message_num"
    ));
    assert_eq!(row.get("message_num"), Some("0"));
    assert_eq!(row.get("message"), Some("'kept'"));
}

#[test]
fn test_unused_mappings() {
    let table = messages_table();
    let config = source(&[("message_num", "p_num"), ("level", "lvl")]);

    assert_eq!(RecordMapper::unused_mappings(&table, &config), vec!["level"]);
}
