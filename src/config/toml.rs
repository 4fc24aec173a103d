//! TOML configuration file parsing
//!
//! ```toml
//! cdf = [[1, 0.5], [2, 0.75], [3, 0.9], [4, 0.95], [5, 1.0]]
//! capacity = 100
//!
//! [workers]
//! threads = 4
//! iterations = 1000
//!
//! [output]
//! path = "output.txt"
//! mode = "append"
//! writer_iterations = 50
//! ```

use super::*;
use crate::config::cli::{Cli, ReportArg};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Load the file named by `--config` (if any) and apply CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    Ok(merge_cli_with_config(cli, config))
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Config {
    if let Some(capacity) = cli.capacity {
        config.capacity = CapacitySetting::Length(capacity);
    }

    if let Some(threads) = cli.threads {
        config.workers.threads = threads;
    }
    if let Some(iterations) = cli.generator_iterations {
        config.workers.iterations = iterations;
    }
    if cli.seed.is_some() {
        config.workers.seed = cli.seed;
    }

    if let Some(path) = &cli.filepath {
        config.output.path = path.clone();
    }
    if let Some(mode) = cli.writemode {
        config.output.mode = mode.into();
    }
    if let Some(iterations) = cli.writer_iterations {
        config.output.writer_iterations = iterations;
    }
    if let Some(ms) = cli.writer_interval_ms {
        config.output.writer_interval_ms = ms;
    }
    if let Some(report) = cli.report {
        config.output.report = match report {
            ReportArg::Text => ReportFormat::Text,
            ReportArg::Json => ReportFormat::Json,
        };
    }
    if cli.json_output.is_some() {
        config.output.json_output = cli.json_output.clone();
    }

    if cli.log_file.is_some() {
        config.logging.log_file = cli.log_file.clone();
    }
    config.logging.debug |= cli.debug;

    config
}
