//! Schema error types

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while building tables or setting row values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The type registry has no converter for this ClickHouse type
    #[error("unsupported column type '{type_name}'")]
    UnsupportedType {
        /// Type name as reported by the server
        type_name: String,
    },

    /// A row mutation referenced a column the table does not declare
    #[error("'{column}' no such column in table '{table}'")]
    NoSuchColumn {
        /// Table name
        table: String,
        /// Requested column name
        column: String,
    },

    /// The value is outside the domain of the column's converter
    #[error("column '{column}': {source}")]
    Conversion {
        /// Column being set
        column: String,
        /// Converter failure
        #[source]
        source: ConversionError,
    },

    /// Two columns share a name
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// Table name
        table: String,
        /// Repeated column name
        column: String,
    },

    /// A table must have at least one insertable column
    #[error("table '{table}' has no insertable columns")]
    NoColumns {
        /// Table name
        table: String,
    },
}

impl SchemaError {
    /// Create an UnsupportedType error
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a NoSuchColumn error
    pub fn no_such_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::NoSuchColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// A converter rejected a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value_kind} to {type_name}: {reason}")]
pub struct ConversionError {
    /// Target ClickHouse type
    pub type_name: String,
    /// Kind of the rejected value (e.g. "string", "array")
    pub value_kind: &'static str,
    /// Why the value was rejected
    pub reason: String,
}

impl ConversionError {
    pub(crate) fn new(
        type_name: impl Into<String>,
        value_kind: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            value_kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_error() {
        let err = SchemaError::unsupported_type("Decimal(10, 2)");
        assert!(err.to_string().contains("Decimal(10, 2)"));
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_no_such_column_error() {
        let err = SchemaError::no_such_column("messages", "bogus");
        assert_eq!(err.to_string(), "'bogus' no such column in table 'messages'");
    }

    #[test]
    fn test_conversion_error_chain() {
        let err = SchemaError::Conversion {
            column: "num".into(),
            source: ConversionError::new("UInt32", "string", "not an integer"),
        };
        let msg = err.to_string();
        assert!(msg.contains("num"));
        assert!(msg.contains("UInt32"));
        assert!(msg.contains("not an integer"));
    }
}
