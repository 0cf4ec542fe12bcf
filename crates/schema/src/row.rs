//! Row of converted literals

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::table::Table;
use crate::value::Value;

/// One row of a [`Table`], holding a literal per column in wire order
///
/// Values are converted when set, so a row is always serializable as-is.
#[derive(Clone)]
pub struct Row {
    table: Arc<Table>,
    values: Vec<Cow<'static, str>>,
}

impl Row {
    pub(crate) fn new(table: Arc<Table>, values: Vec<Cow<'static, str>>) -> Self {
        Self { table, values }
    }

    /// Convert `value` with the column's converter and store the literal
    ///
    /// # Errors
    ///
    /// [`SchemaError::NoSuchColumn`] for an undeclared column and
    /// [`SchemaError::Conversion`] when the converter rejects the value. In
    /// both cases the row is left unchanged.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        let index = self
            .table
            .index_of(column)
            .ok_or_else(|| SchemaError::no_such_column(self.table.name(), column))?;

        let literal = self.table.columns()[index]
            .column_type
            .convert(&value.into())
            .map_err(|source| SchemaError::Conversion {
                column: column.to_owned(),
                source,
            })?;

        self.values[index] = Cow::Owned(literal);
        Ok(())
    }

    /// Literal currently stored for `column`
    pub fn get(&self, column: &str) -> Option<&str> {
        self.table.index_of(column).map(|i| self.values[i].as_ref())
    }

    /// Literals in wire order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(AsRef::as_ref)
    }

    /// `(column, literal)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table
            .columns()
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.name.as_str(), v.as_ref()))
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append `(v1,v2,...,vN)` to `out`
    pub fn write_tuple(&self, out: &mut String) {
        out.push('(');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(value);
        }
        out.push(')');
    }

    /// Bytes [`Row::write_tuple`] will append
    pub fn tuple_len(&self) -> usize {
        2 + self.values.len().saturating_sub(1) + self.values.iter().map(|v| v.len()).sum::<usize>()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.table.name() == other.table.name() && self.values == other.values
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
