//! Describe command - check that a table can be written
//!
//! Lists each insertable column with its type and whether rows can carry
//! values for it.
//!
//! # Usage
//!
//! ```bash
//! flushline describe messages
//! flushline describe messages --url http://clickhouse:8123 --database logs
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use flushline_config::Config;
use flushline_schema::{ColumnType, SchemaError};
use flushline_writer::{ClickHouseTransport, ColumnInfo, Transport};
use owo_colors::OwoColorize;

use super::transport_config;

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Table to describe
    pub table: String,

    /// ClickHouse HTTP URL. Overrides [store] url.
    #[arg(long)]
    pub url: Option<String>,

    /// Database holding the table. Overrides [store] database.
    #[arg(long)]
    pub database: Option<String>,
}

/// Whether one column can be written
#[derive(Debug)]
pub struct ColumnCheck {
    pub name: String,
    pub type_name: String,
    pub result: Result<ColumnType, SchemaError>,
}

impl ColumnCheck {
    pub fn is_supported(&self) -> bool {
        self.result.is_ok()
    }
}

/// Look up each column type in the registry
pub fn check_columns(columns: Vec<ColumnInfo>) -> Vec<ColumnCheck> {
    columns
        .into_iter()
        .map(|c| ColumnCheck {
            result: ColumnType::parse(&c.type_name),
            name: c.name,
            type_name: c.type_name,
        })
        .collect()
}

/// Apply `--url` / `--database` and validate the result
fn apply_overrides(args: &DescribeArgs, config: &mut Config) -> Result<()> {
    if let Some(ref url) = args.url {
        config.store.url.clone_from(url);
    }
    if let Some(ref database) = args.database {
        config.store.database.clone_from(database);
    }
    config.validate().context("invalid command line override")
}

pub async fn run(args: DescribeArgs, mut config: Config) -> Result<()> {
    apply_overrides(&args, &mut config)?;
    let store = &config.store;

    println!();
    println!("{}", "Flushline Describe".bold());
    println!("{}", "─".repeat(50));
    println!("Table         {}", args.table.cyan());
    println!("Database      {}", store.database.cyan());
    println!("URL           {}", store.url.dimmed());
    println!("{}", "─".repeat(50));
    println!();

    let transport = Arc::new(
        ClickHouseTransport::new(transport_config(store))
            .context("failed to create ClickHouse transport")?,
    );

    print!("Connecting to ClickHouse... ");
    match transport.ping().await {
        Ok(()) => println!("{}", "✓".green()),
        Err(e) => {
            println!("{}", "✗".red());
            println!("  {}", e.to_string().red());
            return Err(e).with_context(|| format!("failed to connect to ClickHouse at {}", store.url));
        }
    }

    if let Ok(version) = transport.version().await {
        println!("  Version: {}", version.dimmed());
    }

    let columns = transport
        .columns(&store.database, &args.table)
        .await
        .with_context(|| format!("failed to read columns of '{}'", args.table))?;
    if columns.is_empty() {
        anyhow::bail!(
            "table '{}.{}' not found or has no insertable columns",
            store.database,
            args.table
        );
    }

    let checks = check_columns(columns);
    let width = checks.iter().map(|c| c.name.len()).max().unwrap_or(0);

    println!("Columns:");
    for check in &checks {
        match check.result {
            Ok(_) => println!(
                "  {:width$}  {}  {}",
                check.name,
                check.type_name.dimmed(),
                "✓".green()
            ),
            Err(ref e) => println!(
                "  {:width$}  {}  {}",
                check.name,
                check.type_name.dimmed(),
                format!("✗ {e}").red()
            ),
        }
    }
    println!();

    let unsupported = checks.iter().filter(|c| !c.is_supported()).count();
    if unsupported > 0 {
        println!(
            "{}",
            "Some columns cannot be written. Rows for this table will be rejected.".yellow()
        );
        println!();
        anyhow::bail!("{unsupported} column(s) use unsupported types");
    }

    println!("{}", "All columns can be written!".green().bold());
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_columns() {
        let checks = check_columns(vec![
            ColumnInfo::new("message_num", "UInt32"),
            ColumnInfo::new("tags", "Array(LowCardinality(String))"),
            ColumnInfo::new("amount", "Decimal(10, 2)"),
        ]);

        assert_eq!(checks.len(), 3);
        assert!(checks[0].is_supported());
        assert!(checks[1].is_supported());
        assert!(!checks[2].is_supported());
        assert_eq!(checks[2].name, "amount");
        assert!(matches!(
            checks[2].result,
            Err(SchemaError::UnsupportedType { ref type_name }) if type_name == "Decimal(10, 2)"
        ));
    }

    fn describe_args(url: Option<&str>, database: Option<&str>) -> DescribeArgs {
        DescribeArgs {
            table: "messages".into(),
            url: url.map(Into::into),
            database: database.map(Into::into),
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        let args = describe_args(Some("https://clickhouse:8443"), Some("logs"));

        apply_overrides(&args, &mut config).unwrap();
        assert_eq!(config.store.url, "https://clickhouse:8443");
        assert_eq!(config.store.database, "logs");
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = Config::default();
        let err = apply_overrides(&describe_args(Some("clickhouse:8123"), None), &mut config)
            .unwrap_err();
        assert!(format!("{err:#}").contains("must start with http:// or https://"));

        let mut config = Config::default();
        assert!(apply_overrides(&describe_args(None, Some("")), &mut config).is_err());
    }

    #[test]
    fn test_check_columns_keeps_order() {
        let checks = check_columns(vec![
            ColumnInfo::new("b", "String"),
            ColumnInfo::new("a", "Int8"),
        ]);
        let names: Vec<_> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
