//! Writer configuration
//!
//! Connection settings for the ClickHouse transport and tuning for the
//! engine's flush loop.

use std::time::Duration;

use clickhouse::Client;

// =============================================================================
// Constants
// =============================================================================

/// Default ClickHouse HTTP URL
pub const DEFAULT_URL: &str = "http://localhost:8123";

/// Default database
pub const DEFAULT_DATABASE: &str = "default";

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(250);

/// Default number of concurrent write tasks
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Default minimum interval between write failure log lines
pub const DEFAULT_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(10);

// =============================================================================
// Transport Configuration
// =============================================================================

/// Configuration for connecting to ClickHouse
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            database: DEFAULT_DATABASE.into(),
            username: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Set the ClickHouse URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the ClickHouse client used for metadata queries
    pub fn build_client(&self) -> Client {
        let mut client = Client::default()
            .with_url(&self.url)
            .with_database(&self.database);

        if let Some(ref username) = self.username {
            client = client.with_user(username);
        }

        if let Some(ref password) = self.password {
            client = client.with_password(password);
        }

        client
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Tuning for the flush loop and write pool
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between scheduled flushes
    pub flush_interval: Duration,

    /// Maximum concurrent write tasks
    pub pool_size: usize,

    /// Per-write deadline; `None` waits for the transport indefinitely
    pub write_timeout: Option<Duration>,

    /// Minimum interval between write failure log lines
    pub error_log_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            pool_size: DEFAULT_POOL_SIZE,
            write_timeout: None,
            error_log_interval: DEFAULT_ERROR_LOG_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Set the flush interval
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the number of concurrent write tasks (at least one)
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Set a per-write deadline
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Set the minimum interval between write failure log lines
    pub fn with_error_log_interval(mut self, interval: Duration) -> Self {
        self.error_log_interval = interval;
        self
    }
}
