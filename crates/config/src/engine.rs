//! Write engine configuration

use std::time::Duration;

use serde::Deserialize;

/// Flush loop and write pool settings
///
/// # Example
///
/// ```toml
/// [engine]
/// table = "messages"
/// flush_interval = "250ms"
/// pool_size = 5
/// write_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target table; the `--table` flag overrides it
    pub table: Option<String>,

    /// Time between flushes
    /// Default: 250ms
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Maximum concurrent writes
    /// Default: 5
    pub pool_size: usize,

    /// Per-write deadline
    /// Default: none (wait for the store indefinitely)
    #[serde(with = "humantime_serde")]
    pub write_timeout: Option<Duration>,

    /// Minimum interval between write failure log lines
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub error_log_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table: None,
            flush_interval: Duration::from_millis(250),
            pool_size: 5,
            write_timeout: None,
            error_log_interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert!(config.table.is_none());
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.pool_size, 5);
        assert!(config.write_timeout.is_none());
        assert_eq!(config.error_log_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_full() {
        let toml = r#"
table = "messages"
flush_interval = "1s"
pool_size = 8
write_timeout = "45s"
error_log_interval = "1m"
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.table.as_deref(), Some("messages"));
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.write_timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.error_log_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_bad_duration() {
        let result: Result<EngineConfig, _> = toml::from_str(r#"flush_interval = "soon""#);
        assert!(result.is_err());
    }
}
