//! Flushline - Writer
//!
//! Buffered, asynchronous batch writer for ClickHouse.
//!
//! # Architecture
//!
//! Producers convert records into [`Row`](flushline_schema::Row)s and hand
//! them to the [`Engine`]. Rows collect in a shared buffer; a background
//! orchestrator drains it on a fixed interval and hands each batch to a
//! bounded pool of write tasks, so store latency never blocks ingestion.
//!
//! ```text
//! [Producer] --Row--> [Buffer] --Batch--> [WritePool (N tasks)] --INSERT--> [ClickHouse]
//! ```
//!
//! Stopping the engine performs one final flush and waits for every write
//! in flight before returning. Failed batches are logged, counted and
//! dropped.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flushline_writer::{ClickHouseTransport, Engine, EngineConfig, TransportConfig};
//!
//! let transport = Arc::new(ClickHouseTransport::new(TransportConfig::default())?);
//! let engine = Engine::open(transport, "messages", EngineConfig::default()).await?;
//!
//! let mut row = engine.default_row();
//! row.set("message", "hello")?;
//! engine.ingest(row)?;
//!
//! let metrics = engine.shutdown().await?;
//! ```

mod batch;
mod buffer;
mod config;
mod engine;
mod error;
mod metrics;
mod pool;
mod scheduler;
mod throttle;
mod transport;

#[cfg(test)]
mod testing;

pub use batch::Batch;
pub use buffer::Buffer;
pub use config::{
    DEFAULT_DATABASE, DEFAULT_ERROR_LOG_INTERVAL, DEFAULT_FLUSH_INTERVAL, DEFAULT_POOL_SIZE,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_URL, EngineConfig, TransportConfig,
};
pub use engine::{Engine, EngineHandle, EngineState};
pub use error::{EngineError, Result, TransportError, WriteError};
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use pool::{WriteOutcome, WritePool, WriteReport};
pub use scheduler::FlushScheduler;
pub use throttle::ErrorThrottle;
pub use transport::{ClickHouseTransport, ColumnInfo, Transport};
