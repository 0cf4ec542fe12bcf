//! Configuration validation
//!
//! Checks values serde cannot:
//! - The store URL is an http(s) URL and a database is named
//! - Flush interval, pool size and timeouts are usable
//! - Field mappings have no empty names

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_store(config)?;
    validate_engine(config)?;
    validate_source(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<()> {
    let store = &config.store;

    if store.url.is_empty() {
        return Err(ConfigError::missing_field("store", "url"));
    }
    if !store.url.starts_with("http://") && !store.url.starts_with("https://") {
        return Err(ConfigError::invalid_value(
            "store",
            "url",
            format!("'{}' must start with http:// or https://", store.url),
        ));
    }
    if store.database.is_empty() {
        return Err(ConfigError::missing_field("store", "database"));
    }
    if store.password.is_some() && store.username.is_none() {
        return Err(ConfigError::missing_field("store", "username"));
    }
    if store.timeout.is_zero() {
        return Err(ConfigError::invalid_value("store", "timeout", "must be positive"));
    }

    Ok(())
}

fn validate_engine(config: &Config) -> Result<()> {
    let engine = &config.engine;

    if let Some(ref table) = engine.table
        && table.trim().is_empty()
    {
        return Err(ConfigError::invalid_value("engine", "table", "must not be empty"));
    }
    if engine.flush_interval < Duration::from_millis(1) {
        return Err(ConfigError::invalid_value(
            "engine",
            "flush_interval",
            "must be at least 1ms",
        ));
    }
    if engine.pool_size == 0 {
        return Err(ConfigError::invalid_value(
            "engine",
            "pool_size",
            "must be at least 1",
        ));
    }
    if engine.write_timeout.is_some_and(|t| t.is_zero()) {
        return Err(ConfigError::invalid_value(
            "engine",
            "write_timeout",
            "must be positive (omit it to disable)",
        ));
    }

    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    for (column, key) in &config.source.fields {
        if column.is_empty() {
            return Err(ConfigError::invalid_value(
                "source.fields",
                "column",
                "column names must not be empty",
            ));
        }
        if key.is_empty() {
            return Err(ConfigError::invalid_value(
                "source.fields",
                column.as_str(),
                "record key must not be empty",
            ));
        }
    }

    Ok(())
}
