//! CLI argument parsing using clap

use crate::output::sink::WriteMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output file open mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WriteModeArg {
    /// Truncate the file first
    #[value(name = "w")]
    Truncate,
    /// Append to existing content
    #[value(name = "a")]
    Append,
}

impl From<WriteModeArg> for WriteMode {
    fn from(arg: WriteModeArg) -> Self {
        match arg {
            WriteModeArg::Truncate => WriteMode::Truncate,
            WriteModeArg::Append => WriteMode::Append,
        }
    }
}

/// End-of-run report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    Text,
    Json,
}

/// cdfgen - runs number generators and consumers concurrently
#[derive(Parser, Debug)]
#[command(name = "cdfgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Draws per generator thread (0 or less runs until interrupted)
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    pub generator_iterations: Option<i64>,

    /// Entries to write (0 or less runs until the generators finish)
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    pub writer_iterations: Option<i64>,

    /// File the newest value is written to
    #[arg(short = 'f', long = "file")]
    pub filepath: Option<PathBuf>,

    /// Output file mode: w (truncate) or a (append)
    #[arg(short = 'm', long = "mode", value_enum)]
    pub writemode: Option<WriteModeArg>,

    /// Number of generator threads
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// History capacity (non-positive values make it unbounded)
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    pub capacity: Option<i64>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pause between persistence iterations in milliseconds
    #[arg(long)]
    pub writer_interval_ms: Option<u64>,

    /// End-of-run report format
    #[arg(long, value_enum)]
    pub report: Option<ReportArg>,

    /// Also write the JSON summary to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "CDFGEN_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Validate and print the configuration without running
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == Some(0) {
            anyhow::bail!("threads must be at least 1");
        }
        Ok(())
    }
}
