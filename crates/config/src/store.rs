//! Store connection configuration

use std::time::Duration;

use serde::Deserialize;

/// ClickHouse connection settings
///
/// # Example
///
/// ```toml
/// [store]
/// url = "http://localhost:8123"
/// database = "default"
/// username = "default"
/// password = ""
/// timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// ClickHouse HTTP interface URL
    /// Default: http://localhost:8123
    pub url: String,

    /// Database holding the target table
    /// Default: default
    pub database: String,

    /// Username for basic auth (optional)
    pub username: Option<String>,

    /// Password for basic auth (optional)
    pub password: Option<String>,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }
}
