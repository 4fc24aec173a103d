//! Human-readable text output

use crate::generator::NumberGenerator;
use crate::util::time::{calculate_rate, format_duration, format_rate};
use crate::worker::{RunReport, WorkerKind};
use std::fmt::Write;
use std::time::Duration;

/// Render the end-of-run summary
///
/// Shows the history state, the frequency percentages (or why they are
/// unavailable) and one line per worker.
pub fn render_results(
    generator: &NumberGenerator,
    report: &RunReport,
    elapsed: Duration,
) -> String {
    let mut out = String::new();
    let draws = report.total_iterations(WorkerKind::Generator);

    // Writing to a String cannot fail
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    let _ = writeln!(out, "                    RUN RESULTS");
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    let _ = writeln!(out);
    let _ = writeln!(out, "Elapsed Time: {}", format_duration(elapsed));
    let _ = writeln!(
        out,
        "Draws:        {} ({} draws/s)",
        draws,
        format_rate(calculate_rate(draws, elapsed))
    );
    let _ = writeln!(
        out,
        "History:      {} / {}",
        generator.queue_length(),
        generator.queue_capacity()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Frequencies:");
    match generator.frequency_percentages() {
        Ok(percentages) => {
            let snapshot = generator.frequencies();
            for (value, pct) in &percentages {
                let _ = writeln!(
                    out,
                    "  {:>6}: {:>7.2}%  ({})",
                    value,
                    pct,
                    snapshot.count(*value)
                );
            }
        }
        Err(e) => {
            let _ = writeln!(out, "  unavailable: {}", e);
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Workers:");
    for worker in report.iter() {
        let outcome = match &worker.error {
            None => "completed".to_string(),
            Some(e) => format!("failed: {}", e),
        };
        let _ = writeln!(
            out,
            "  {:<10} {:<12} {:>8} iterations  {}",
            worker.id.to_string(),
            worker.kind.to_string(),
            worker.iterations,
            outcome
        );
    }

    out
}

/// Print the end-of-run summary to stdout
pub fn print_results(generator: &NumberGenerator, report: &RunReport, elapsed: Duration) {
    print!("{}", render_results(generator, report, elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::worker::ConcurrentRunner;
    use std::sync::Arc;

    #[test]
    fn test_render_after_run() {
        let generator = Arc::new(NumberGenerator::with_defaults(Arc::new(
            RecordingDiagnostics::new(),
        )));
        let runner = ConcurrentRunner::new(generator.clone()).with_seed(1);
        let report = runner.run_generators(2, 10).unwrap();

        let text = render_results(&generator, &report, Duration::from_millis(5));
        assert!(text.contains("RUN RESULTS"));
        assert!(text.contains("History:      20 / 100"));
        assert!(text.contains("worker-0"));
        assert!(text.contains("worker-1"));
        assert!(text.contains('%'));
    }

    #[test]
    fn test_render_empty_history() {
        let generator = NumberGenerator::with_defaults(Arc::new(RecordingDiagnostics::new()));
        let text = render_results(&generator, &RunReport::default(), Duration::ZERO);
        assert!(text.contains("unavailable: Zero division error"));
    }
}
