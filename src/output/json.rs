//! JSON output
//!
//! Machine-readable end-of-run summary.

use crate::generator::NumberGenerator;
use crate::history::HistoryEntry;
use crate::worker::{RunReport, WorkerKind};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct JsonWorker {
    pub id: usize,
    pub kind: String,
    pub succeeded: bool,
    pub iterations: u64,
    pub idle_iterations: u64,
    pub elapsed_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub elapsed_sec: f64,
    pub draws: u64,
    pub history_length: usize,
    /// `None` when the history is unbounded
    pub history_capacity: Option<usize>,
    pub counts: BTreeMap<i64, u64>,
    /// `None` when percentages are unavailable (see `frequency_error`)
    pub percentages: Option<BTreeMap<i64, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_error: Option<String>,
    pub last_entry: Option<HistoryEntry>,
    pub workers: Vec<JsonWorker>,
}

/// Collect the end-of-run summary
pub fn build_summary(
    generator: &NumberGenerator,
    report: &RunReport,
    elapsed: Duration,
) -> JsonSummary {
    let (percentages, frequency_error) = match generator.frequency_percentages() {
        Ok(p) => (Some(p), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let workers = report
        .iter()
        .map(|w| JsonWorker {
            id: w.id.0,
            kind: w.kind.to_string(),
            succeeded: w.succeeded(),
            iterations: w.iterations,
            idle_iterations: w.idle_iterations,
            elapsed_sec: w.elapsed.as_secs_f64(),
            error: w.error.as_ref().map(|e| e.to_string()),
        })
        .collect();

    JsonSummary {
        elapsed_sec: elapsed.as_secs_f64(),
        draws: report.total_iterations(WorkerKind::Generator),
        history_length: generator.queue_length(),
        history_capacity: generator.queue_capacity().limit(),
        counts: generator.frequencies().counts().clone(),
        percentages,
        frequency_error,
        last_entry: generator.last_entry(),
        workers,
    }
}

/// Render the summary as pretty-printed JSON
pub fn render_summary(
    generator: &NumberGenerator,
    report: &RunReport,
    elapsed: Duration,
) -> Result<String> {
    let summary = build_summary(generator, report, elapsed);
    serde_json::to_string_pretty(&summary).context("Failed to serialize JSON summary")
}

/// Write the summary to a file
pub fn write_summary(path: &Path, summary: &JsonSummary) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create JSON output: {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::worker::ConcurrentRunner;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_summary_after_run() {
        let generator = Arc::new(NumberGenerator::with_defaults(Arc::new(
            RecordingDiagnostics::new(),
        )));
        let runner = ConcurrentRunner::new(generator.clone()).with_seed(9);
        let report = runner.run_generators(3, 10).unwrap();

        let summary = build_summary(&generator, &report, Duration::from_secs(1));
        assert_eq!(summary.draws, 30);
        assert_eq!(summary.history_length, 30);
        assert_eq!(summary.history_capacity, Some(100));
        assert_eq!(summary.counts.values().sum::<u64>(), 30);
        assert!(summary.frequency_error.is_none());
        assert_eq!(summary.workers.len(), 3);

        let total: f64 = summary.percentages.unwrap().values().sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_empty_summary() {
        let generator = NumberGenerator::with_defaults(Arc::new(RecordingDiagnostics::new()));
        let text = render_summary(&generator, &RunReport::default(), Duration::ZERO).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["history_length"], 0);
        assert!(value["percentages"].is_null());
        assert!(value["frequency_error"].as_str().unwrap().contains("Zero division"));
        // BTreeMap<i64, _> keys serialize as strings
        assert_eq!(value["counts"]["1"], 0);
    }

    #[test]
    fn test_write_summary_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.json");
        let generator = NumberGenerator::with_defaults(Arc::new(RecordingDiagnostics::new()));
        let summary = build_summary(&generator, &RunReport::default(), Duration::ZERO);

        write_summary(&path, &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"history_capacity\": 100"));
    }
}
