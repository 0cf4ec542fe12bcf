//! Writer errors

use std::time::Duration;

use flushline_schema::SchemaError;

/// Errors from the store transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request could not be sent or its response not read
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        message: String,
    },

    /// ClickHouse client error (metadata queries)
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// The write did not finish within the configured timeout
    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

/// A batch could not be written; the batch is dropped
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The transport rejected the insert
    #[error("failed to write {rows} rows to '{table}': {source}")]
    Failed {
        /// Target table
        table: String,
        /// Rows in the dropped batch
        rows: usize,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// The write task panicked or was aborted
    #[error("write task failed: {0}")]
    TaskFailed(String),
}

impl WriteError {
    /// Rows lost with this batch, when known
    pub fn rows(&self) -> Option<usize> {
        match self {
            Self::Failed { rows, .. } => Some(*rows),
            Self::TaskFailed(_) => None,
        }
    }
}

/// Errors from the engine API
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Table metadata could not be turned into a table model
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Metadata could not be fetched
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The store reports no insertable columns for the table
    #[error("table '{database}.{table}' not found or has no insertable columns")]
    UnknownTable {
        /// Database searched
        database: String,
        /// Requested table
        table: String,
    },

    /// A row built for another table was handed to this engine
    #[error("row belongs to table '{actual}', engine writes '{expected}'")]
    TableMismatch {
        /// Engine table
        expected: String,
        /// Row table
        actual: String,
    },

    /// The engine has performed its final flush and accepts no more rows
    #[error("engine stopped")]
    Stopped,

    /// The orchestrator task panicked
    #[error("orchestrator task failed: {0}")]
    TaskPanicked(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
