//! Flushline - Schema
//!
//! Column type registry and row model for ClickHouse `INSERT ... VALUES`.
//!
//! Every value written into a [`Row`] is converted to a ClickHouse literal
//! immediately, using the converter of the column's [`ColumnType`]. A row is
//! therefore always ready to be serialized as `(v1,v2,...,vN)` without any
//! further work on the flush path.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use flushline_schema::{Table, Value};
//!
//! let table = Arc::new(
//!     Table::from_type_names("messages", "default", [("num", "UInt32"), ("text", "String")])
//!         .unwrap(),
//! );
//!
//! let mut row = table.default_row();
//! row.set("num", 42u32).unwrap();
//! row.set("text", "it's here").unwrap();
//!
//! assert_eq!(row.get("num"), Some("42"));
//! assert_eq!(row.get("text"), Some(r"'it\'s here'"));
//! assert!(row.set("missing", Value::Null).is_err());
//! ```
//!
//! # Supported types
//!
//! | Type | Literal |
//! |------|---------|
//! | `Int*`, `UInt*` | `-5` |
//! | `Float32`, `Float64` | `12.5`, `nan`, `inf` |
//! | `Bool` | `true` |
//! | `String`, `FixedString(N)`, `UUID` | `'escaped\ttext'` |
//! | `Enum8(...)`, `Enum16(...)` | `'name'` or `2` |
//! | `Array(T)` | `[1,2,3]` |
//! | `Nullable(T)` | `NULL` or the literal of `T` |
//! | `LowCardinality(T)` | the literal of `T` |
//! | `Date`, `Date32` | `'2020-01-01'` |
//! | `DateTime` | `'2020-01-01 00:00:00'` |
//! | `DateTime64(P)` | `1577836800.000` |

mod error;
mod literal;
mod row;
mod table;
mod types;
mod value;

pub use error::{ConversionError, Result, SchemaError};
pub use literal::{quote_identifier, quote_string};
pub use row::Row;
pub use table::{Column, Table};
pub use types::ColumnType;
pub use value::Value;
