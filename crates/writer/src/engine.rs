//! Flush orchestrator
//!
//! The engine owns one buffer, one scheduler and one write pool per table.
//! Producers append rows through [`Engine::ingest`] or an [`EngineHandle`];
//! a background task flushes the buffer whenever the scheduler fires and
//! performs a blocking final flush when the stop signal is raised.
//!
//! ```text
//! ingest ──► [Buffer] ──drain──► [Orchestrator] ──submit──► [WritePool] ──► Transport
//!                                   ▲      │
//!                    scheduler fire ┘      └ reconcile outcomes
//! ```

use std::sync::Arc;

use flushline_schema::{Row, Table};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::batch::Batch;
use crate::buffer::Buffer;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::metrics::{EngineMetrics, EngineMetricsSnapshot};
use crate::pool::{WriteOutcome, WritePool};
use crate::scheduler::FlushScheduler;
use crate::throttle::ErrorThrottle;
use crate::transport::Transport;

// =============================================================================
// State
// =============================================================================

/// Where the orchestrator is in its flush cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Waiting for the next trigger
    Idle,
    /// Swapping the buffer out
    Draining,
    /// Handing a batch to the pool
    Submitting,
    /// Observing finished writes
    Reconciling,
    /// Final flush done; no more rows are accepted
    Terminal,
}

/// State shared between producers and the orchestrator
struct Shared {
    table: Arc<Table>,
    buffer: Buffer,
    metrics: EngineMetrics,
    state: Mutex<EngineState>,
}

impl Shared {
    fn set_state(&self, state: EngineState) {
        *self.state.lock() = state;
    }

    fn ingest(&self, row: Row) -> Result<()> {
        if !Arc::ptr_eq(row.table(), &self.table) {
            self.metrics.record_rejected();
            return Err(EngineError::TableMismatch {
                expected: self.table.name().to_owned(),
                actual: row.table().name().to_owned(),
            });
        }

        match self.buffer.append(row) {
            Ok(()) => {
                self.metrics.record_ingested();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_rejected();
                Err(e)
            }
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Buffered, pooled batch writer for one table
///
/// Dropping the engine raises the stop signal; the final flush then runs in
/// the background. Use [`Engine::shutdown`] to wait for it.
pub struct Engine {
    shared: Arc<Shared>,
    stop: CancellationToken,
    orchestrator: Option<JoinHandle<()>>,
}

impl Engine {
    /// Fetch the table's column metadata and start an engine for it
    ///
    /// # Errors
    ///
    /// Fails if the metadata cannot be read, the table has no insertable
    /// columns, or any column type is unsupported.
    pub async fn open(
        transport: Arc<dyn Transport>,
        table: &str,
        config: EngineConfig,
    ) -> Result<Self> {
        let database = transport.database().to_owned();
        let columns = transport.columns(&database, table).await?;
        if columns.is_empty() {
            return Err(EngineError::UnknownTable {
                database,
                table: table.to_owned(),
            });
        }

        let table = Table::from_type_names(
            table,
            database,
            columns.into_iter().map(|c| (c.name, c.type_name)),
        )?;

        Ok(Self::start(transport, Arc::new(table), config))
    }

    /// Start an engine for an already built table
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(transport: Arc<dyn Transport>, table: Arc<Table>, config: EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            table,
            buffer: Buffer::new(),
            metrics: EngineMetrics::new(),
            state: Mutex::new(EngineState::Idle),
        });
        let stop = CancellationToken::new();

        let orchestrator = Orchestrator {
            shared: Arc::clone(&shared),
            scheduler: FlushScheduler::new(config.flush_interval),
            pool: WritePool::new(transport, config.pool_size, config.write_timeout),
            failures: ErrorThrottle::new(config.error_log_interval),
            stop: stop.clone(),
        };
        let orchestrator = tokio::spawn(orchestrator.run());

        Self {
            shared,
            stop,
            orchestrator: Some(orchestrator),
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.shared.table
    }

    /// A fresh row for this engine's table
    pub fn default_row(&self) -> Row {
        self.shared.table.default_row()
    }

    /// Hand a completed row to the engine; never waits on I/O
    ///
    /// # Errors
    ///
    /// [`EngineError::TableMismatch`] for a row of another table and
    /// [`EngineError::Stopped`] after the final flush.
    pub fn ingest(&self, row: Row) -> Result<()> {
        self.shared.ingest(row)
    }

    /// Cloneable ingest handle for producers on other tasks or threads
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Token that triggers the final flush when cancelled
    pub fn stop_signal(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.lock()
    }

    /// Raise the stop signal and wait for the final flush and every write
    pub async fn shutdown(mut self) -> Result<EngineMetricsSnapshot> {
        self.stop.cancel();
        if let Some(orchestrator) = self.orchestrator.take() {
            orchestrator
                .await
                .map_err(|e| EngineError::TaskPanicked(e.to_string()))?;
        }
        Ok(self.shared.metrics.snapshot())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.orchestrator.is_some() {
            tracing::debug!(table = %self.shared.table.name(), "engine dropped without shutdown");
        }
        self.stop.cancel();
    }
}

/// Producer side of an [`Engine`]
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub fn table(&self) -> &Arc<Table> {
        &self.shared.table
    }

    pub fn default_row(&self) -> Row {
        self.shared.table.default_row()
    }

    /// See [`Engine::ingest`]
    pub fn ingest(&self, row: Row) -> Result<()> {
        self.shared.ingest(row)
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn state(&self) -> EngineState {
        *self.shared.state.lock()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Background task driving flushes
struct Orchestrator {
    shared: Arc<Shared>,
    scheduler: FlushScheduler,
    pool: WritePool,
    failures: ErrorThrottle,
    stop: CancellationToken,
}

impl Orchestrator {
    async fn run(mut self) {
        tracing::info!(
            table = %self.shared.table.name(),
            database = %self.shared.table.database(),
            columns = self.shared.table.columns().len(),
            flush_interval = ?self.scheduler.interval(),
            pool_size = self.pool.size(),
            "write engine starting"
        );

        self.scheduler.arm();

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = self.scheduler.fired() => self.flush().await,
            }
        }

        self.final_flush().await;

        let snapshot = self.shared.metrics.snapshot();
        tracing::info!(
            table = %self.shared.table.name(),
            rows_ingested = snapshot.rows_ingested,
            rows_written = snapshot.rows_written,
            batches_written = snapshot.batches_written,
            write_errors = snapshot.write_errors,
            rows_dropped = snapshot.rows_dropped,
            failures_unlogged = snapshot.failures_unlogged,
            "write engine stopped"
        );
    }

    /// Scheduled flush: drain, submit, reconcile, rearm
    async fn flush(&mut self) {
        self.shared.set_state(EngineState::Draining);
        let rows = self.shared.buffer.drain();
        let outstanding = self.pool.outstanding();
        self.shared.metrics.record_flush(rows.is_empty());

        if !rows.is_empty() {
            self.shared.set_state(EngineState::Submitting);
            self.submit(rows).await;
        }

        self.shared.set_state(EngineState::Reconciling);
        let finished = self.pool.reap_finished();
        self.observe(finished);

        // Keep at most one generation of writes behind the current one
        let waited = self.pool.await_any_of(&outstanding).await;
        self.observe(waited);

        self.shared.set_state(EngineState::Idle);
        self.scheduler.arm();
    }

    /// Final flush: nothing is accepted after the drain and every write is
    /// awaited
    async fn final_flush(&mut self) {
        self.scheduler.cancel();

        self.shared.set_state(EngineState::Draining);
        let rows = self.shared.buffer.drain_and_close();
        self.shared.metrics.record_flush(rows.is_empty());

        tracing::debug!(
            table = %self.shared.table.name(),
            rows = rows.len(),
            in_flight = self.pool.in_flight(),
            "final flush"
        );

        if !rows.is_empty() {
            self.shared.set_state(EngineState::Submitting);
            self.submit(rows).await;
        }

        self.shared.set_state(EngineState::Reconciling);
        let outcomes = self.pool.await_all().await;
        self.observe(outcomes);

        self.shared.set_state(EngineState::Terminal);
    }

    async fn submit(&mut self, rows: Vec<Row>) {
        let count = rows.len();
        let batch = Batch::new(Arc::clone(&self.shared.table), rows);

        match self.pool.submit(batch).await {
            Ok(_) => {
                self.shared.metrics.record_submitted();
                tracing::trace!(table = %self.shared.table.name(), rows = count, "batch submitted");
            }
            Err(e) => {
                self.shared.metrics.record_write_error(count as u64);
                self.report_failure(&e);
            }
        }
    }

    fn observe(&mut self, outcomes: Vec<WriteOutcome>) {
        for outcome in outcomes {
            match outcome {
                Ok(report) => {
                    self.shared.metrics.record_written(report.rows as u64);
                    tracing::debug!(
                        table = %report.table,
                        rows = report.rows,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "batch written"
                    );
                }
                Err(e) => {
                    let rows = e.rows().unwrap_or(0);
                    self.shared.metrics.record_write_error(rows as u64);
                    self.report_failure(&e);
                }
            }
        }
    }

    fn report_failure(&mut self, error: &dyn std::fmt::Display) {
        if !self.failures.record(self.shared.table.name(), error) {
            self.shared.metrics.record_unlogged_failure();
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
