//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! CLI values take precedence over the file; anything unset falls back to
//! the defaults below.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::distribution::{raw_entries, RawEntry, DEFAULT_CDF};
use crate::history::CapacitySetting;
use crate::output::sink::WriteMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Distribution table as `[value, cumulative probability]` rows
    #[serde(default = "default_cdf")]
    pub cdf: Vec<RawEntry>,
    /// History capacity; unusable values degrade to unbounded
    #[serde(default)]
    pub capacity: CapacitySetting,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdf: default_cdf(),
            capacity: CapacitySetting::default(),
            workers: WorkerConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_cdf() -> Vec<RawEntry> {
    raw_entries(&DEFAULT_CDF)
}

/// Generator worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of generator threads
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Draws per generator thread (0 or less runs until stopped)
    #[serde(default)]
    pub iterations: i64,
    /// Base seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            iterations: 0,
            seed: None,
        }
    }
}

fn default_threads() -> usize {
    1
}

/// End-of-run report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Persistence and report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File the persistence worker writes to
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub mode: WriteMode,
    /// Entries to write (0 or less runs until stopped)
    #[serde(default)]
    pub writer_iterations: i64,
    /// Pause between persistence iterations
    #[serde(default)]
    pub writer_interval_ms: u64,
    #[serde(default)]
    pub report: ReportFormat,
    /// Also write the JSON summary to this file
    pub json_output: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            mode: WriteMode::default(),
            writer_iterations: 0,
            writer_interval_ms: 0,
            report: ReportFormat::default(),
            json_output: None,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Lower the default level to DEBUG
    #[serde(default)]
    pub debug: bool,
}

fn describe_iterations(n: i64) -> String {
    if n > 0 {
        n.to_string()
    } else {
        "until stopped".to_string()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  CDF rows:          {}", self.cdf.len())?;
        match &self.capacity {
            CapacitySetting::Length(n) => writeln!(f, "  Capacity:          {}", n)?,
            CapacitySetting::Other(v) => writeln!(f, "  Capacity:          {} (unusable)", v)?,
        }
        writeln!(f, "  Generator threads: {}", self.workers.threads)?;
        writeln!(f, "  Draws per thread:  {}", describe_iterations(self.workers.iterations))?;
        if let Some(seed) = self.workers.seed {
            writeln!(f, "  Seed:              {}", seed)?;
        }
        writeln!(
            f,
            "  Output file:       {} ({:?})",
            self.output.path.display(),
            self.output.mode
        )?;
        write!(f, "  Writer iterations: {}", describe_iterations(self.output.writer_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cdf.len(), 5);
        assert_eq!(config.capacity, CapacitySetting::Length(100));
        assert_eq!(config.workers.threads, 1);
        assert_eq!(config.output.path, PathBuf::from("output.txt"));
        assert_eq!(config.output.mode, WriteMode::Truncate);
        assert_eq!(config.output.report, ReportFormat::Text);
    }

    #[test]
    fn test_display_mentions_indefinite_mode() {
        let text = Config::default().to_string();
        assert!(text.contains("until stopped"));
        assert!(text.contains("output.txt"));
    }
}
