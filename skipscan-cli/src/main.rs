use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skipscan::progress::ScanProgress;
use skipscan::{
    scan_with_progress, Match, MatchSink, ReportWriter, ScanConfig, ScanError, ScanResult,
    ScanSummary, DEFAULT_BLOCK_CAPACITY,
};

/// Scan a file for a fixed byte pattern without loading it into memory
#[derive(Parser, Debug)]
#[command(name = "skipscan", version, about)]
struct Cli {
    /// File to scan
    file: PathBuf,

    /// Pattern to search for, as literal bytes (see --hex). May also be
    /// set in a config file.
    pattern: Option<String>,

    /// Interpret the pattern as hex digits, e.g. "7f454c46"
    #[arg(long)]
    hex: bool,

    /// Bytes per window block (two blocks stay resident)
    #[arg(long)]
    block_size: Option<usize>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the stderr progress indicator
    #[arg(long)]
    no_progress: bool,

    /// Suppress per-match output and print only the closing summary
    #[arg(short, long)]
    stats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = ScanConfig::load_from(cli.config.as_deref())?;
    let config = file_config.merge_with_cli(ScanConfig {
        pattern: cli.pattern.clone().unwrap_or_default(),
        input_path: cli.file.clone(),
        block_size: cli.block_size.unwrap_or(DEFAULT_BLOCK_CAPACITY),
        progress: !cli.no_progress,
        log_level: cli.log_level.clone(),
    });

    init_tracing(&config.log_level);
    debug!(
        input = %config.input_path.display(),
        block_size = config.block_size,
        "configuration resolved"
    );

    let pattern = resolve_pattern(&config.pattern, cli.hex)?;

    let file = File::open(&config.input_path)
        .map_err(|e| ScanError::open_error(&config.input_path, e))?;
    let total_bytes = file.metadata().ok().map(|m| m.len());

    let progress = if config.progress {
        match total_bytes {
            Some(total) => ScanProgress::new(total),
            None => ScanProgress::unbounded(),
        }
    } else {
        ScanProgress::hidden()
    };

    let outcome = run_scan(file, &pattern, &config, &progress, cli.stats);
    progress.finish();
    let summary = outcome?;

    print_summary(&summary);
    Ok(())
}

fn run_scan(
    file: File,
    pattern: &[u8],
    config: &ScanConfig,
    progress: &ScanProgress,
    stats_only: bool,
) -> Result<ScanSummary> {
    if stats_only {
        let mut sink = DiscardSink;
        Ok(scan_with_progress(file, pattern, config, &mut sink, progress)?)
    } else {
        let stdout = io::stdout();
        let mut sink = ReportWriter::new(BufWriter::new(stdout.lock()));
        let summary = scan_with_progress(file, pattern, config, &mut sink, progress)?;
        sink.flush().context("failed to flush report output")?;
        Ok(summary)
    }
}

/// Sink for --stats runs; the engine still counts matches
struct DiscardSink;

impl MatchSink for DiscardSink {
    fn on_match(&mut self, _matched: &Match) -> ScanResult<()> {
        Ok(())
    }
}

/// Turns the configured pattern text into raw bytes, decoding hex when
/// requested
fn resolve_pattern(text: &str, hex: bool) -> Result<Vec<u8>> {
    if text.is_empty() {
        anyhow::bail!("no pattern given: pass one as an argument or set it in a config file");
    }
    if hex {
        Ok(decode_hex(text)?)
    } else {
        Ok(text.as_bytes().to_vec())
    }
}

/// Decodes hex digits into bytes, ignoring whitespace between pairs
fn decode_hex(text: &str) -> Result<Vec<u8>, ScanError> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(ScanError::invalid_pattern(
            "hex pattern needs an even number of digits",
        ));
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => bytes.push(hi << 4 | lo),
            _ => {
                return Err(ScanError::invalid_pattern(format!(
                    "invalid hex digit in \"{}{}\"",
                    pair[0] as char, pair[1] as char
                )))
            }
        }
    }
    Ok(bytes)
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

fn print_summary(summary: &ScanSummary) {
    let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);
    let matches = if summary.total_matches > 0 {
        summary.total_matches.to_string().green().bold()
    } else {
        summary.total_matches.to_string().yellow()
    };
    eprintln!(
        "{} match(es), {} bytes read in {} blocks, {} probes, {}",
        matches,
        summary.bytes_read,
        summary.blocks_read,
        summary.probes,
        humantime::format_duration(elapsed)
    );
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
