//! In-memory transport for pool and engine tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flushline_schema::Table;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::{ColumnInfo, Transport};

/// Records every statement it is asked to execute
#[derive(Default)]
pub(crate) struct RecordingTransport {
    columns: Vec<ColumnInfo>,
    delay: Duration,
    fail: AtomicBool,
    attempts: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    written: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Report these columns for any table lookup
    pub(crate) fn with_columns(mut self, columns: &[(&str, &str)]) -> Self {
        self.columns = columns
            .iter()
            .map(|(name, ty)| ColumnInfo::new(*name, *ty))
            .collect();
        self
    }

    /// Sleep this long inside every execute
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Statements that succeeded, in completion order
    pub(crate) fn written(&self) -> Vec<String> {
        self.written.lock().clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent executes observed
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn database(&self) -> &str {
        "default"
    }

    async fn execute(&self, sql: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Other("injected failure".into()));
        }
        self.written.lock().push(sql.to_owned());
        Ok(())
    }

    async fn columns(
        &self,
        _database: &str,
        _table: &str,
    ) -> Result<Vec<ColumnInfo>, TransportError> {
        Ok(self.columns.clone())
    }
}

/// Single `num UInt64` column table
pub(crate) fn numbers_table() -> Arc<Table> {
    Arc::new(Table::from_type_names("numbers", "default", [("num", "UInt64")]).unwrap_or_else(
        |e| panic!("numbers table: {e}"),
    ))
}

/// Values of `num` in every written statement, in statement order
pub(crate) fn written_numbers(transport: &RecordingTransport) -> Vec<u64> {
    let preamble = "INSERT INTO numbers (num) VALUES ";
    transport
        .written()
        .iter()
        .flat_map(|sql| {
            let tuples = sql
                .strip_prefix(preamble)
                .unwrap_or_else(|| panic!("unexpected statement {sql}"));
            tuples
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split("),(")
                .map(|n| n.parse::<u64>().unwrap_or_else(|_| panic!("bad tuple {n}")))
                .collect::<Vec<_>>()
        })
        .collect()
}
