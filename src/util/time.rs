//! Timing utilities
//!
//! History entries carry wall-clock timestamps as fractional seconds since
//! the Unix epoch; run summaries format elapsed durations for humans.

use chrono::Utc;
use std::time::Duration;

/// Current wall-clock time in seconds since the Unix epoch
///
/// Microsecond resolution.
#[inline]
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Elapsed time with the largest unit that keeps the value at or above 1
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }

    let nanos = nanos as f64;
    let (scale, unit) = [(1e9, "s"), (1e6, "ms"), (1e3, "us")]
        .into_iter()
        .find(|(scale, _)| nanos >= *scale)
        .unwrap_or((1e3, "us"));
    format!("{:.2}{}", nanos / scale, unit)
}

/// Draw rate with a K/M/G suffix above one thousand per second
pub fn format_rate(rate: f64) -> String {
    match [(1e9, "G"), (1e6, "M"), (1e3, "K")]
        .into_iter()
        .find(|(scale, _)| rate >= *scale)
    {
        Some((scale, suffix)) => format!("{:.2}{}", rate / scale, suffix),
        None => format!("{:.0}", rate),
    }
}

/// Operations per second over `duration` (0 for an empty duration)
pub fn calculate_rate(operations: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}
