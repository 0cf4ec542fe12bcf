//! Store transport
//!
//! The engine talks to the store through [`Transport`]: one call to execute a
//! complete insert statement, one to read a table's column metadata.

use async_trait::async_trait;
use clickhouse::Client;
use serde::Deserialize;

use crate::config::TransportConfig;
use crate::error::TransportError;

/// Longest server error body kept in [`TransportError::Server`]
const MAX_ERROR_BODY: usize = 512;

/// Column metadata as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, clickhouse::Row, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Connection to the store
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Database tables are looked up in
    fn database(&self) -> &str;

    /// Execute one complete SQL statement
    async fn execute(&self, sql: &str) -> Result<(), TransportError>;

    /// Insertable columns of `database.table` in wire order
    ///
    /// An unknown table yields an empty list.
    async fn columns(&self, database: &str, table: &str)
    -> Result<Vec<ColumnInfo>, TransportError>;
}

// =============================================================================
// ClickHouse HTTP Transport
// =============================================================================

/// Transport over the ClickHouse HTTP interface
///
/// Inserts are sent as the raw POST body so literal text reaches the server
/// untouched. Metadata queries go through the `clickhouse` client with bound
/// parameters.
pub struct ClickHouseTransport {
    config: TransportConfig,
    http: reqwest::Client,
    client: Client,
}

impl ClickHouseTransport {
    /// Create a transport; no connection is made until first use
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let client = config.build_client();

        Ok(Self {
            config,
            http,
            client,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Check that the server answers
    pub async fn ping(&self) -> Result<(), TransportError> {
        self.client.query("SELECT 1").execute().await?;
        Ok(())
    }

    /// Server version string
    pub async fn version(&self) -> Result<String, TransportError> {
        let version = self
            .client
            .query("SELECT version()")
            .fetch_one::<String>()
            .await?;
        Ok(version)
    }
}

#[async_trait]
impl Transport for ClickHouseTransport {
    fn database(&self) -> &str {
        &self.config.database
    }

    async fn execute(&self, sql: &str) -> Result<(), TransportError> {
        let mut request = self
            .http
            .post(&self.config.url)
            .query(&[
                ("database", self.config.database.as_str()),
                ("input_format_null_as_default", "1"),
            ])
            .body(sql.to_owned());

        if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Server {
            status: status.as_u16(),
            message: truncate(body.trim()),
        })
    }

    async fn columns(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, TransportError> {
        let columns = self
            .client
            .query(
                "SELECT name, type AS type_name FROM system.columns \
                 WHERE database = ? AND table = ? \
                 AND default_kind NOT IN ('MATERIALIZED', 'ALIAS') \
                 ORDER BY position",
            )
            .bind(database)
            .bind(table)
            .fetch_all::<ColumnInfo>()
            .await?;
        Ok(columns)
    }
}

/// Truncate a server message for error reporting
fn truncate(message: &str) -> String {
    if message.len() <= MAX_ERROR_BODY {
        return message.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;
