//! CLI for the ringlog line buffer.
//!
//! Provides commands for tailing, watching, and benchmarking line streams
//! buffered in a ring log.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use ringlog::{ContainsFilter, Follower, RingLog, RingLogConfig, Watcher, WriterSink, pump};
use tracing_subscriber::EnvFilter;

/// ringlog - Buffer a line stream and serve it to many readers.
#[derive(Parser)]
#[command(name = "ringlog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Buffer a file or stdin and print its newest lines.
    Tail {
        /// File to read (stdin when omitted).
        file: Option<PathBuf>,

        /// Lines to retain (overrides the config file).
        #[arg(long)]
        capacity: Option<usize>,

        /// JSON config file for the log.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of newest lines to print.
        #[arg(short = 'n', long, default_value = "10", conflicts_with = "all")]
        lines: usize,

        /// Print every retained line.
        #[arg(long)]
        all: bool,

        /// Only keep lines containing this pattern.
        #[arg(long)]
        grep: Option<String>,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Read stdin until a line containing a pattern appears.
    Watch {
        /// Pattern to wait for.
        #[arg(long)]
        pattern: String,

        /// How long to wait (e.g., "500ms", "30s", "5m").
        #[arg(long, default_value = "30s")]
        timeout: String,

        /// Echo every line to stdout while waiting.
        #[arg(long)]
        echo: bool,

        /// Lines to retain.
        #[arg(long, default_value = "4096")]
        capacity: usize,
    },

    /// Run a write-path benchmark with concurrent followers.
    Bench {
        /// Number of lines to write.
        #[arg(long, default_value = "1000000")]
        lines: u64,

        /// Lines to retain.
        #[arg(long, default_value = "4096")]
        capacity: usize,

        /// Number of concurrent followers.
        #[arg(long, default_value = "2")]
        readers: usize,
    },
}

/// Output format for `tail`.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One line per line.
    Text,
    /// JSON document with the lines and log stats.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tail {
            file,
            capacity,
            config,
            lines,
            all,
            grep,
            format,
        } => {
            let count = if all { None } else { Some(lines) };
            cmd_tail(
                file.as_deref(),
                capacity,
                config.as_deref(),
                count,
                grep,
                &format,
            )
        }
        Commands::Watch {
            pattern,
            timeout,
            echo,
            capacity,
        } => cmd_watch(&pattern, &timeout, echo, capacity),
        Commands::Bench {
            lines,
            capacity,
            readers,
        } => cmd_bench(lines, capacity, readers),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Builds the log configuration from an optional file and overrides.
fn load_config(
    config: Option<&Path>,
    capacity: Option<usize>,
) -> Result<RingLogConfig, Box<dyn std::error::Error>> {
    let mut config = match config {
        Some(path) => RingLogConfig::load(path)?,
        None => RingLogConfig::default(),
    };
    if let Some(capacity) = capacity {
        config.capacity = capacity;
    }
    config.validate()?;
    Ok(config)
}

/// Implements `ringlog tail [file]`.
fn cmd_tail(
    file: Option<&Path>,
    capacity: Option<usize>,
    config: Option<&Path>,
    count: Option<usize>,
    grep: Option<String>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config, capacity)?;
    let mut log = RingLog::from_config(&config)?;
    if let Some(pattern) = grep {
        log = log.with_filter(ContainsFilter::new(pattern));
    }

    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            format!("cannot open '{}': {e}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    let read = pump::pump_lines(&log, reader)?;
    tracing::debug!(read, stored = log.len(), "input buffered");

    let lines = newest_lines(&log, count);

    match format {
        OutputFormat::Text => {
            for line in &lines {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "log": log.name(),
                "count": lines.len(),
                "lines": lines,
                "stats": log.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Returns the newest `count` retained lines (all when `None`), oldest first.
fn newest_lines(log: &RingLog, count: Option<usize>) -> Vec<String> {
    let mut lines = log.list_all();
    if let Some(n) = count {
        lines.drain(..lines.len().saturating_sub(n));
    }
    lines
}

/// Implements `ringlog watch --pattern <pat>`.
fn cmd_watch(
    pattern: &str,
    timeout: &str,
    echo: bool,
    capacity: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let timeout = parse_duration(timeout)?;

    let mut log = RingLog::from_config(&RingLogConfig {
        name: "stdin".to_string(),
        capacity,
        ..RingLogConfig::default()
    })?;
    if echo {
        log = log.with_sink(WriterSink::new(io::stdout()));
    }
    let log = Arc::new(log);

    let mut watcher = Watcher::attach(Arc::clone(&log));
    // The pump is left running on exit; it may be blocked on stdin.
    let _pump = pump::spawn_pump(Arc::clone(&log), BufReader::new(io::stdin()), "stdin-pump")?;

    let line = watcher.wait_for(|line| line.contains(pattern), timeout)?;
    if !echo {
        println!("{line}");
    }
    tracing::info!(pattern, lines = log.total_written(), "pattern found");

    Ok(())
}

/// Implements `ringlog bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(lines: u64, capacity: usize, readers: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("ringlog write-path benchmark");
    println!("  Lines: {lines}");
    println!("  Capacity: {capacity}");
    println!("  Readers: {readers}");
    println!();

    let log = Arc::new(RingLog::new(capacity)?);

    let followers: Vec<_> = (0..readers)
        .map(|_| {
            let (_, mut follower) = Follower::attach(Arc::clone(&log));
            thread::spawn(move || {
                let mut received = 0u64;
                while received + follower.dropped() < lines {
                    let batch = follower.poll();
                    if batch.is_empty() {
                        thread::yield_now();
                    }
                    received += batch.len() as u64;
                }
                (received, follower.dropped())
            })
        })
        .collect();

    println!("Writing {lines} lines...");

    let payload = "[00:00:00] [Server thread/INFO]: benchmark line";
    let start = Instant::now();

    for _ in 0..lines {
        log.write(payload);
    }

    let elapsed = start.elapsed();
    let ns_per_write = elapsed.as_nanos() as f64 / lines.max(1) as f64;
    let writes_per_sec = lines as f64 / elapsed.as_secs_f64();

    println!();
    println!("Results:");
    println!("  Total writes: {}", log.total_written());
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_write:.1} ns/write");
    println!("  Throughput: {writes_per_sec:.0} writes/sec");

    for (i, follower) in followers.into_iter().enumerate() {
        let (received, dropped) = follower
            .join()
            .map_err(|_| format!("follower {i} panicked"))?;
        println!("  Follower {i}: received={received}, dropped={dropped}");
    }
    println!();

    Ok(())
}

/// Parses a human-readable duration string (e.g., "250ms", "30s", "5m").
fn parse_duration(s: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Empty duration string".into());
    }

    if let Some(millis) = s.strip_suffix("ms") {
        return Ok(Duration::from_millis(millis.parse()?));
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: u64 = num_str.parse()?;

    let secs = match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        _ => return Err(format!("Unknown duration unit: '{unit}'. Use ms, s, m, or h.").into()),
    };

    Ok(Duration::from_secs(secs))
}
