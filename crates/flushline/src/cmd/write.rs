//! Write command - stream JSON lines into a table
//!
//! Reads one JSON object per line, converts it into a row of the target
//! table and hands it to the write engine. At end of input (or on Ctrl+C /
//! SIGTERM with `--follow`) the engine performs its final flush and the
//! command prints what was written.
//!
//! # Usage
//!
//! ```bash
//! flushline write events.jsonl --table messages
//! cat events.jsonl | flushline write --config configs/flushline.toml
//! flushline write app.jsonl --follow
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use flushline_config::Config;
use flushline_writer::{ClickHouseTransport, Engine, EngineHandle, EngineMetricsSnapshot};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use super::{engine_config, transport_config, wait_for_shutdown};
use crate::record::{ParsedLine, RecordMapper, parse_line};

/// How long `--follow` waits at end of input before reading again
const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// JSONL file to read (stdin when omitted)
    pub input: Option<PathBuf>,

    /// Target table. Overrides [engine] table.
    #[arg(short, long)]
    pub table: Option<String>,

    /// Keep reading at end of input until Ctrl+C or SIGTERM
    #[arg(short, long)]
    pub follow: bool,
}

/// Counters for the input side
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// Lines read, blank ones included
    pub lines: u64,
    /// Rows handed to the engine
    pub records: u64,
    /// Lines that were not a JSON object
    pub invalid_lines: u64,
    /// Record keys that feed no column
    pub unknown_keys: u64,
    /// Values a column refused
    pub rejected_values: u64,
}

pub async fn run(args: WriteArgs, config: Config) -> Result<()> {
    let table = args
        .table
        .clone()
        .or_else(|| config.engine.table.clone())
        .context("no target table: pass --table or set [engine] table")?;

    let transport = ClickHouseTransport::new(transport_config(&config.store))
        .context("failed to create ClickHouse transport")?;
    let engine = Engine::open(Arc::new(transport), &table, engine_config(&config.engine))
        .await
        .with_context(|| format!("failed to open table '{}.{}'", config.store.database, table))?;

    for column in RecordMapper::unused_mappings(engine.table(), &config.source) {
        warn!(column, table = %table, "field mapping names a column the table does not have");
    }
    let mapper = RecordMapper::new(engine.table(), &config.source);

    info!(
        table = %table,
        database = %config.store.database,
        columns = engine.table().columns().len(),
        follow = args.follow,
        "writing records"
    );

    let input = open_input(args.input.as_deref()).await?;
    let read = read_records(
        BufReader::new(input),
        &engine.handle(),
        &mapper,
        args.follow,
        wait_for_shutdown(),
    )
    .await;

    // The engine still owns buffered rows when reading fails
    let metrics = engine.shutdown().await.context("write engine failed")?;
    let stats = read?;

    print_summary(&table, &stats, &metrics);

    if metrics.write_errors > 0 {
        anyhow::bail!(
            "{} batch(es) failed, {} row(s) dropped",
            metrics.write_errors,
            metrics.rows_dropped
        );
    }

    Ok(())
}

/// Open the input file, or stdin when no path is given
async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

/// Read lines until end of input (or `shutdown` when following)
///
/// A trailing line without a newline is held back in follow mode until the
/// rest of it arrives.
pub async fn read_records<R, S>(
    mut reader: R,
    engine: &EngineHandle,
    mapper: &RecordMapper,
    follow: bool,
    shutdown: S,
) -> Result<ReadStats>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut stats = ReadStats::default();
    let mut line = Vec::new();

    loop {
        let read = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping input");
                break;
            }
            read = reader.read_until(b'\n', &mut line) => read.context("failed to read input")?,
        };

        if read == 0 {
            if !follow {
                break;
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping input");
                    break;
                }
                _ = tokio::time::sleep(FOLLOW_POLL_INTERVAL) => continue,
            }
        }

        if follow && line.last() != Some(&b'\n') {
            continue;
        }

        stats.lines += 1;
        ingest_line(&line, stats.lines, engine, mapper, &mut stats)?;
        line.clear();
    }

    if !line.is_empty() {
        stats.lines += 1;
        ingest_line(&line, stats.lines, engine, mapper, &mut stats)?;
    }

    Ok(stats)
}

fn ingest_line(
    bytes: &[u8],
    number: u64,
    engine: &EngineHandle,
    mapper: &RecordMapper,
    stats: &mut ReadStats,
) -> Result<()> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            stats.invalid_lines += 1;
            warn!(line = number, error = %e, "skipping line that is not UTF-8");
            return Ok(());
        }
    };

    let record = match parse_line(text) {
        Ok(ParsedLine::Record(record)) => record,
        Ok(ParsedLine::Blank) => return Ok(()),
        Err(e) => {
            stats.invalid_lines += 1;
            warn!(line = number, error = %e, "skipping invalid line");
            return Ok(());
        }
    };

    let mut row = engine.default_row();
    let mapped = mapper.apply(&mut row, record);

    if mapped.unknown_keys > 0 {
        debug!(line = number, keys = mapped.unknown_keys, "skipped unknown keys");
    }
    for e in &mapped.rejected {
        warn!(line = number, error = %e, "value rejected, column left at default");
    }
    stats.unknown_keys += mapped.unknown_keys as u64;
    stats.rejected_values += mapped.rejected.len() as u64;

    engine
        .ingest(row)
        .context("write engine stopped while reading input")?;
    stats.records += 1;

    Ok(())
}

fn print_summary(table: &str, stats: &ReadStats, metrics: &EngineMetricsSnapshot) {
    println!();
    println!("{}", "Flushline Write".bold());
    println!("{}", "─".repeat(50));
    println!("Table           {}", table.cyan());
    println!("Lines read      {}", stats.lines);
    println!("Records         {}", stats.records);
    if stats.invalid_lines > 0 {
        println!("Invalid lines   {}", stats.invalid_lines.yellow());
    }
    if stats.unknown_keys > 0 {
        println!("Unknown keys    {}", stats.unknown_keys.dimmed());
    }
    if stats.rejected_values > 0 {
        println!("Rejected values {}", stats.rejected_values.yellow());
    }
    println!("{}", "─".repeat(50));
    println!(
        "Batches         {} written / {} submitted",
        metrics.batches_written, metrics.batches_submitted
    );
    println!("Rows written    {}", metrics.rows_written.green());
    if metrics.write_errors > 0 {
        println!(
            "Write errors    {} ({} rows dropped)",
            metrics.write_errors.red(),
            metrics.rows_dropped.red()
        );
    }
    println!(
        "Flushes         {} ({} empty)",
        metrics.flush_cycles, metrics.empty_flushes
    );
    println!();
}

#[cfg(test)]
#[path = "write_test.rs"]
mod write_test;
