//! Table model
//!
//! A [`Table`] is built once from the server's column metadata and then
//! shared read-only (`Arc<Table>`) by every row, the buffer and the writer.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::literal::quote_identifier;
use crate::row::Row;
use crate::types::ColumnType;

/// A table column; `index` is its position in the wire tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub index: usize,
    pub column_type: ColumnType,
}

/// An insertable ClickHouse table
#[derive(Debug)]
pub struct Table {
    name: String,
    database: String,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    defaults: Vec<Cow<'static, str>>,
    preamble: String,
}

impl Table {
    /// Build a table from ordered `(column name, column type)` pairs
    ///
    /// # Errors
    ///
    /// Fails on duplicate column names or an empty column list.
    pub fn new(
        name: impl Into<String>,
        database: impl Into<String>,
        columns: impl IntoIterator<Item = (String, ColumnType)>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut by_name = HashMap::new();
        let mut cols = Vec::new();

        for (index, (column_name, column_type)) in columns.into_iter().enumerate() {
            if by_name.insert(column_name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: column_name,
                });
            }
            cols.push(Column {
                name: column_name,
                index,
                column_type,
            });
        }

        if cols.is_empty() {
            return Err(SchemaError::NoColumns { table: name });
        }

        let defaults = cols
            .iter()
            .map(|c| c.column_type.default_value())
            .collect();

        let column_list = cols
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(",");
        let preamble = format!(
            "INSERT INTO {} ({}) VALUES ",
            quote_identifier(&name),
            column_list
        );

        Ok(Self {
            name,
            database: database.into(),
            columns: cols,
            by_name,
            defaults,
            preamble,
        })
    }

    /// Build a table from `(column name, type name)` pairs, resolving each
    /// type through the registry
    ///
    /// # Errors
    ///
    /// The first unsupported type aborts with [`SchemaError::UnsupportedType`].
    pub fn from_type_names<N, T>(
        name: impl Into<String>,
        database: impl Into<String>,
        columns: impl IntoIterator<Item = (N, T)>,
    ) -> Result<Self, SchemaError>
    where
        N: Into<String>,
        T: AsRef<str>,
    {
        let columns = columns
            .into_iter()
            .map(|(n, t)| Ok((n.into(), ColumnType::parse(t.as_ref())?)))
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Self::new(name, database, columns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Columns in wire order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    /// `INSERT INTO <table> (<c1>,<c2>,...) VALUES `
    pub fn insert_preamble(&self) -> &str {
        &self.preamble
    }

    /// A fresh row with every column at its default literal
    ///
    /// Defaults are `'static`, so this allocates the value vector and nothing
    /// else.
    pub fn default_row(self: &Arc<Self>) -> Row {
        Row::new(Arc::clone(self), self.defaults.clone())
    }

    pub(crate) fn index_of(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }
}
