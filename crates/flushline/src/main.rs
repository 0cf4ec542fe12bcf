//! Flushline - Buffered batch writes into ClickHouse
//!
//! # Usage
//!
//! ```bash
//! # Write a JSONL file into the configured table
//! flushline write events.jsonl --config configs/flushline.toml
//!
//! # Keep reading stdin until Ctrl-C
//! tail -F app.log | flushline write --table messages --follow
//!
//! # Check that every column of a table can be written
//! flushline describe messages
//! ```

mod cmd;
mod record;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flushline_config::{Config, LogConfig, LogFormat, LogLevel, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Flushline - Buffered batch writes into ClickHouse
#[derive(Parser, Debug)]
#[command(name = "flushline")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true, env = "FLUSHLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true, value_parser = LogLevel::from_str)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write JSON lines from a file or stdin into a table
    Write(cmd::write::WriteArgs),

    /// Show a table's columns and whether each one can be written
    Describe(cmd::describe::DescribeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).with_context(|| match cli.config {
        Some(ref path) => format!("failed to load config from {}", path.display()),
        None => "invalid default configuration".to_string(),
    })?;

    let log_level = resolve_log_level(cli.log_level, &config.log);
    init_logging(&config.log, log_level)?;

    match cli.command {
        Command::Write(args) => cmd::write::run(args, config).await,
        Command::Describe(args) => cmd::describe::run(args, config).await,
    }
}

/// Resolve log level: CLI flag > config file > default "info"
///
/// An empty `[log]` section deserializes to `info`, so the config value is
/// the default when no file was given.
fn resolve_log_level(cli_level: Option<LogLevel>, config: &LogConfig) -> LogLevel {
    cli_level.unwrap_or(config.level)
}

/// Initialize the tracing subscriber for logging
fn init_logging(config: &LogConfig, level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_new(level.as_str())
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match config.output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::File(ref path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    match config.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .with(filter)
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_log_level_prefers_flag() {
        let config = LogConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(
            resolve_log_level(Some(LogLevel::Debug), &config),
            LogLevel::Debug
        );
        assert_eq!(resolve_log_level(None, &config), LogLevel::Warn);
    }

    #[test]
    fn test_resolve_log_level_default() {
        assert_eq!(resolve_log_level(None, &LogConfig::default()), LogLevel::Info);
    }

    #[test]
    fn test_log_level_flag_is_validated() {
        let result = Cli::try_parse_from(["flushline", "describe", "messages", "--log-level", "inf"]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown log level 'inf'"));

        let cli =
            Cli::try_parse_from(["flushline", "describe", "messages", "-l", "WARNING"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
    }

    #[test]
    fn test_parse_write_args() {
        let cli = Cli::try_parse_from([
            "flushline",
            "write",
            "events.jsonl",
            "--table",
            "messages",
            "--follow",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Command::Write(args) => {
                assert_eq!(args.input, Some(PathBuf::from("events.jsonl")));
                assert_eq!(args.table.as_deref(), Some("messages"));
                assert!(args.follow);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_describe_requires_table() {
        assert!(Cli::try_parse_from(["flushline", "describe"]).is_err());
    }
}
