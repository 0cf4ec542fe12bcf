//! Flushline Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Every section is optional; an empty file writes to a local ClickHouse.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use flushline_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[engine]\ntable = \"messages\"").unwrap();
//! assert_eq!(config.engine.table.as_deref(), Some("messages"));
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//! output = "stderr"
//!
//! [store]
//! url = "http://localhost:8123"
//! database = "default"
//! username = "default"
//! password = ""
//! timeout = "30s"
//!
//! [engine]
//! table = "messages"
//! flush_interval = "250ms"
//! pool_size = 5
//! write_timeout = "30s"
//!
//! [source.fields]
//! message_num = "p_num"
//! ```

mod engine;
mod error;
mod logging;
mod source;
mod store;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use engine::EngineConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use source::SourceConfig;
pub use store::StoreConfig;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// ClickHouse connection
    pub store: StoreConfig,

    /// Flush loop and write pool
    pub engine: EngineConfig,

    /// Record to column mapping
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values serde cannot
    ///
    /// Run again after overriding fields from the command line.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
