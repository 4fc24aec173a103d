//! cdfgen CLI entry point

use anyhow::{Context, Result};
use cdfgen::config::{cli::Cli, validator, Config, ReportFormat};
use cdfgen::diagnostics::TracingDiagnostics;
use cdfgen::generator::NumberGenerator;
use cdfgen::output::sink::FileSink;
use cdfgen::output::{json, text};
use cdfgen::worker::ConcurrentRunner;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = cdfgen::config::toml::load_config(&cli)?;
    cdfgen::logging::init_logging(&config.logging)?;

    validator::validate_config(&config).context("Configuration validation failed")?;

    if cli.dry_run {
        println!("{}", config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    tracing::info!("cdfgen v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "configuration loaded");

    run(&config)
}

/// Start the persistence worker in the background, run the generators to
/// completion, then wait for the persistence worker.
///
/// Indefinite generators (`-g 0`) only end when the process is terminated.
fn run(config: &Config) -> Result<()> {
    let start = Instant::now();

    let generator = Arc::new(NumberGenerator::new(
        &config.cdf,
        &config.capacity,
        Arc::new(TracingDiagnostics),
    ));
    let mut runner = ConcurrentRunner::new(generator.clone());
    if let Some(seed) = config.workers.seed {
        runner = runner.with_seed(seed);
    }

    // A bad destination is a per-worker failure, not a run failure
    let writer = match FileSink::open(&config.output.path, config.output.mode) {
        Ok(sink) => Some(
            runner
                .spawn_persistence(
                    config.output.writer_iterations,
                    Box::new(sink),
                    Duration::from_millis(config.output.writer_interval_ms),
                )
                .context("Failed to start persistence worker")?,
        ),
        Err(e) => {
            tracing::error!(error = %e, "persistence disabled");
            None
        }
    };

    let mut report = runner
        .run_generators(config.workers.threads, config.workers.iterations)
        .context("Failed to start generator workers")?;

    // Generators are done: an indefinite writer has nothing new to persist,
    // and a bounded one waiting on an empty history would never finish
    if config.output.writer_iterations <= 0 || generator.queue_length() == 0 {
        runner.stop();
    }
    if let Some(writer) = writer {
        report.insert(writer.join());
    }
    let elapsed = start.elapsed();

    match config.output.report {
        ReportFormat::Text => text::print_results(&generator, &report, elapsed),
        ReportFormat::Json => {
            println!("{}", json::render_summary(&generator, &report, elapsed)?)
        }
    }
    if let Some(path) = &config.output.json_output {
        json::write_summary(path, &json::build_summary(&generator, &report, elapsed))?;
    }

    if !report.all_succeeded() {
        tracing::warn!(
            failed = report.failures().count(),
            "some workers did not complete"
        );
    }

    Ok(())
}
