//! Drained batch and its insert statement

use std::sync::Arc;

use flushline_schema::{Row, Table};

/// Rows drained from the buffer in one go, owned by the writer from then on
#[derive(Debug)]
pub struct Batch {
    table: Arc<Table>,
    rows: Vec<Row>,
}

impl Batch {
    pub fn new(table: Arc<Table>, rows: Vec<Row>) -> Self {
        Self { table, rows }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `INSERT INTO t (c1,...) VALUES (..),(..)` in buffer order
    pub fn to_sql(&self) -> String {
        let preamble = self.table.insert_preamble();
        let capacity = preamble.len()
            + self.rows.iter().map(Row::tuple_len).sum::<usize>()
            + self.rows.len().saturating_sub(1);

        let mut sql = String::with_capacity(capacity);
        sql.push_str(preamble);
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            row.write_tuple(&mut sql);
        }
        sql
    }
}
