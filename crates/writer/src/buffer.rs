//! Shared row buffer
//!
//! Producers append completed rows; the orchestrator swaps the whole vector
//! out. The lock is held for the push or the swap and nothing else.

use std::mem;

use flushline_schema::Row;
use parking_lot::Mutex;

use crate::error::EngineError;

#[derive(Debug, Default)]
struct State {
    rows: Vec<Row>,
    closed: bool,
}

/// Mutex-guarded ordered sequence of rows awaiting flush
#[derive(Debug, Default)]
pub struct Buffer {
    state: Mutex<State>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    ///
    /// Fails with [`EngineError::Stopped`] once the final drain has happened.
    pub fn append(&self, row: Row) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(EngineError::Stopped);
        }
        state.rows.push(row);
        Ok(())
    }

    /// Take every buffered row, leaving the buffer empty
    pub fn drain(&self) -> Vec<Row> {
        mem::take(&mut self.state.lock().rows)
    }

    /// Take every buffered row and refuse further appends
    pub fn drain_and_close(&self) -> Vec<Row> {
        let mut state = self.state.lock();
        state.closed = true;
        mem::take(&mut state.rows)
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use flushline_schema::Table;

    use super::*;

    fn table() -> Arc<Table> {
        Arc::new(Table::from_type_names("t", "default", [("n", "UInt64")]).unwrap())
    }

    fn row(table: &Arc<Table>, n: u64) -> Row {
        let mut row = table.default_row();
        row.set("n", n).unwrap();
        row
    }

    #[test]
    fn test_drain_takes_everything_in_order() {
        let table = table();
        let buffer = Buffer::new();
        for n in 0..3 {
            buffer.append(row(&table, n)).unwrap();
        }

        let drained = buffer.drain();
        let values: Vec<_> = drained.iter().map(|r| r.get("n").unwrap()).collect();
        assert_eq!(values, ["0", "1", "2"]);
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_closed_buffer_rejects_appends() {
        let table = table();
        let buffer = Buffer::new();
        buffer.append(row(&table, 1)).unwrap();

        assert_eq!(buffer.drain_and_close().len(), 1);
        assert!(buffer.is_closed());
        assert!(matches!(
            buffer.append(row(&table, 2)),
            Err(EngineError::Stopped)
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_concurrent_appends_and_drains_lose_nothing() {
        const PRODUCERS: u64 = 8;
        const PER_PRODUCER: u64 = 2_000;

        let table = table();
        let buffer = Arc::new(Buffer::new());

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let buffer = Arc::clone(&buffer);
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        buffer.append(row(&table, p * PER_PRODUCER + i)).unwrap();
                    }
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut drained = 0;
        while producers.iter().any(|h| !h.is_finished()) {
            for r in buffer.drain() {
                assert!(seen.insert(r.get("n").unwrap().to_owned()));
                drained += 1;
            }
        }
        for handle in producers {
            handle.join().unwrap();
        }
        for r in buffer.drain_and_close() {
            assert!(seen.insert(r.get("n").unwrap().to_owned()));
            drained += 1;
        }

        assert_eq!(drained, PRODUCERS * PER_PRODUCER);
    }
}
