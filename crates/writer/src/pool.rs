//! Bounded write pool
//!
//! Write tasks run on the tokio runtime, at most `size` at a time. Each task
//! holds a semaphore permit for the duration of its write, so [`WritePool::submit`]
//! only waits when every permit is taken. Results stay in the pool until the
//! orchestrator observes them.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

use crate::batch::Batch;
use crate::error::{EngineError, TransportError, WriteError};
use crate::transport::Transport;

/// A batch the store accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub table: String,
    pub rows: usize,
    pub elapsed: Duration,
}

/// Result of one write task
pub type WriteOutcome = Result<WriteReport, WriteError>;

/// Bounded set of concurrent write tasks
pub struct WritePool {
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<WriteOutcome>,
    running: HashSet<Id>,
    size: usize,
    write_timeout: Option<Duration>,
}

impl WritePool {
    pub fn new(transport: Arc<dyn Transport>, size: usize, write_timeout: Option<Duration>) -> Self {
        let size = size.max(1);
        Self {
            transport,
            permits: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            running: HashSet::new(),
            size,
            write_timeout,
        }
    }

    /// Maximum concurrent writes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks whose outcome has not been observed yet
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Ids of tasks whose outcome has not been observed yet
    pub fn outstanding(&self) -> HashSet<Id> {
        self.running.clone()
    }

    pub fn is_outstanding(&self, id: Id) -> bool {
        self.running.contains(&id)
    }

    /// Start writing a batch, waiting for a free slot if the pool is full
    pub async fn submit(&mut self, batch: Batch) -> Result<Id, EngineError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Stopped)?;

        let transport = Arc::clone(&self.transport);
        let write_timeout = self.write_timeout;

        let handle = self.tasks.spawn(async move {
            let _permit = permit;
            let table = batch.table().name().to_owned();
            let rows = batch.len();
            let sql = batch.to_sql();
            drop(batch);

            let started = Instant::now();
            let result = match write_timeout {
                Some(limit) => tokio::time::timeout(limit, transport.execute(&sql))
                    .await
                    .unwrap_or(Err(TransportError::Timeout(limit))),
                None => transport.execute(&sql).await,
            };

            match result {
                Ok(()) => Ok(WriteReport {
                    table,
                    rows,
                    elapsed: started.elapsed(),
                }),
                Err(source) => Err(WriteError::Failed {
                    table,
                    rows,
                    source,
                }),
            }
        });

        let id = handle.id();
        self.running.insert(id);
        Ok(id)
    }

    /// Collect outcomes of tasks that already finished, without waiting
    pub fn reap_finished(&mut self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            outcomes.push(self.observe(joined));
        }
        outcomes
    }

    /// Wait for the next task to finish; `None` when nothing is in flight
    pub async fn await_any(&mut self) -> Option<WriteOutcome> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(self.observe(joined))
    }

    /// Wait until at least one of `ids` has finished
    ///
    /// Returns immediately if `ids` is empty or one of them has already been
    /// observed. Outcomes of other tasks finishing meanwhile are returned too.
    pub async fn await_any_of(&mut self, ids: &HashSet<Id>) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::new();
        if ids.is_empty() {
            return outcomes;
        }

        while ids.iter().all(|id| self.running.contains(id)) {
            let Some(joined) = self.tasks.join_next_with_id().await else {
                break;
            };
            outcomes.push(self.observe(joined));
        }
        outcomes
    }

    /// Wait for every in-flight task
    pub async fn await_all(&mut self) -> Vec<WriteOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next_with_id().await {
            outcomes.push(self.observe(joined));
        }
        outcomes
    }

    fn observe(&mut self, joined: Result<(Id, WriteOutcome), JoinError>) -> WriteOutcome {
        match joined {
            Ok((id, outcome)) => {
                self.running.remove(&id);
                outcome
            }
            Err(e) => {
                self.running.remove(&e.id());
                Err(WriteError::TaskFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
