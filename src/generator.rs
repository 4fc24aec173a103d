//! Number generator
//!
//! [`NumberGenerator`] ties a [`CdfTable`] to a [`BoundedHistory`]: every
//! successful draw is appended to the history, and frequency percentages are
//! reported from it.
//!
//! The table is swapped wholesale by [`NumberGenerator::set_cdf`]; workers
//! clone the current `Arc` per draw and never hold the table lock while
//! sampling or appending.
//!
//! # Example
//!
//! ```
//! use cdfgen::diagnostics::TracingDiagnostics;
//! use cdfgen::distribution::sampler::Sampler;
//! use cdfgen::generator::NumberGenerator;
//! use std::sync::Arc;
//!
//! let generator = NumberGenerator::with_defaults(Arc::new(TracingDiagnostics));
//! let mut sampler = Sampler::with_seed(1);
//!
//! let value = generator.generate(&mut sampler).unwrap();
//! assert!((1..=5).contains(&value));
//! assert_eq!(generator.queue_length(), 1);
//! ```

use crate::diagnostics::Diagnostics;
use crate::distribution::sampler::Sampler;
use crate::distribution::{CdfTable, RawEntry};
use crate::error::{DistributionError, GeneratorError};
use crate::history::frequency::FrequencySnapshot;
use crate::history::{BoundedHistory, Capacity, CapacitySetting, HistoryEntry};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Samples a configured distribution into a shared bounded history
pub struct NumberGenerator {
    table: RwLock<Arc<CdfTable>>,
    history: BoundedHistory,
    diagnostics: Arc<dyn Diagnostics>,
}

impl NumberGenerator {
    /// Create a generator
    ///
    /// Neither argument can make construction fail: an invalid table is kept
    /// tagged invalid, and an unusable capacity degrades to unbounded (reported
    /// through `diagnostics`).
    pub fn new(
        entries: &[RawEntry],
        capacity: &CapacitySetting,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self::from_table(CdfTable::new(entries), capacity, diagnostics)
    }

    /// Create a generator around an already built table
    pub fn from_table(
        table: CdfTable,
        capacity: &CapacitySetting,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        if let Some(message) = table.message() {
            diagnostics.degraded("distribution", &message);
        }
        let history = BoundedHistory::from_setting(capacity, table.values(), diagnostics.as_ref());
        Self {
            table: RwLock::new(Arc::new(table)),
            history,
            diagnostics,
        }
    }

    /// Default five-value table with a capacity of 100
    pub fn with_defaults(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self::from_table(CdfTable::default_table(), &CapacitySetting::default(), diagnostics)
    }

    /// Replace the distribution
    ///
    /// On failure the generator keeps an empty, invalid table and every later
    /// [`generate`](Self::generate) call reports the same error.
    pub fn set_cdf(&self, entries: &[RawEntry]) -> Result<(), DistributionError> {
        self.replace_table(CdfTable::new(entries))
    }

    /// Replace the distribution with an already built table
    pub fn replace_table(&self, table: CdfTable) -> Result<(), DistributionError> {
        let status = table.status();
        match status {
            Ok(()) => self.history.track(table.values()),
            Err(e) => self.diagnostics.degraded("distribution", &e.to_string()),
        }
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(table);
        status
    }

    /// Current table
    pub fn cdf(&self) -> Arc<CdfTable> {
        self.table.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_valid(&self) -> bool {
        self.cdf().is_valid()
    }

    /// Diagnostic for an invalid table
    pub fn message(&self) -> Option<String> {
        self.cdf().message()
    }

    /// Draw one value and append it to the history
    ///
    /// # Errors
    ///
    /// [`GeneratorError::InvalidDistribution`] when the current table is
    /// invalid; nothing is appended in that case.
    pub fn generate(&self, sampler: &mut Sampler) -> Result<i64, GeneratorError> {
        let table = self.cdf();
        table.status()?;
        let value = sampler.sample(&table).ok_or(DistributionError::Incomplete)?;
        self.history.append(value);
        Ok(value)
    }

    /// Percentage of the history held by each tracked value
    ///
    /// # Errors
    ///
    /// The table's error when it is invalid, otherwise
    /// [`GeneratorError::EmptyHistory`] when nothing has been generated.
    pub fn frequency_percentages(&self) -> Result<BTreeMap<i64, f64>, GeneratorError> {
        self.cdf().status()?;
        self.history.snapshot().percentages()
    }

    /// Counts and length from one consistent state
    pub fn frequencies(&self) -> FrequencySnapshot {
        self.history.snapshot()
    }

    pub fn queue_length(&self) -> usize {
        self.history.len()
    }

    pub fn queue_capacity(&self) -> Capacity {
        self.history.capacity()
    }

    pub fn last_entry(&self) -> Option<HistoryEntry> {
        self.history.last_entry()
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::distribution::{raw_entries, RawField, DEFAULT_CDF};
    use std::collections::VecDeque;

    fn quiet() -> Arc<RecordingDiagnostics> {
        Arc::new(RecordingDiagnostics::new())
    }

    #[test]
    fn test_invalid_cdf_refuses_to_generate() {
        let diag = quiet();
        let generator = NumberGenerator::new(
            &[],
            &CapacitySetting::Other(serde_json::Value::String("100".into())),
            diag.clone(),
        );
        let mut sampler = Sampler::with_seed(1);

        let err = generator.generate(&mut sampler).unwrap_err();
        assert_eq!(err.to_string(), "Cdf must be non-empty list of tuples");
        assert_eq!(generator.queue_capacity(), Capacity::Unbounded);
        assert_eq!(generator.queue_length(), 0);

        for pairs in [
            vec![(1, 0.4), (2, 1.6)],
            vec![(1, 0.4), (2, 0.6)],
            vec![(1, 0.4), (2, 0.3)],
        ] {
            assert!(generator.set_cdf(&raw_entries(&pairs)).is_err());
            let err = generator.generate(&mut sampler).unwrap_err();
            assert!(err.to_string().contains("Cdf is invalid."), "{}", err);
        }

        let malformed = vec![
            RawEntry::pair(1, 0.4),
            RawEntry(vec![RawField::Int(2), RawField::Float(0.6), RawField::Int(0)]),
            RawEntry::pair(2, 1.0),
        ];
        assert!(generator.set_cdf(&malformed).is_err());
        let err = generator.generate(&mut sampler).unwrap_err();
        assert!(err.to_string().contains("Cdf is invalid."));

        // Capacity fallback plus each rejected table were reported
        assert!(diag.notices().len() >= 5);
    }

    #[test]
    fn test_recovers_after_valid_cdf() {
        let generator = NumberGenerator::new(&[], &CapacitySetting::Length(10), quiet());
        assert!(!generator.is_valid());
        assert!(generator.message().is_some());

        generator.set_cdf(&raw_entries(&[(7, 1.0)])).unwrap();
        assert!(generator.is_valid());

        let mut sampler = Sampler::with_seed(3);
        assert_eq!(generator.generate(&mut sampler), Ok(7));
        assert_eq!(generator.frequency_percentages().unwrap()[&7], 100.0);
    }

    #[test]
    fn test_percentages_on_empty_history() {
        let generator = NumberGenerator::with_defaults(quiet());
        assert_eq!(
            generator.frequency_percentages(),
            Err(GeneratorError::EmptyHistory)
        );
    }

    #[test]
    fn test_percentages_with_invalid_table_report_table_error() {
        let generator = NumberGenerator::with_defaults(quiet());
        let mut sampler = Sampler::with_seed(5);
        generator.generate(&mut sampler).unwrap();

        let _ = generator.set_cdf(&raw_entries(&[(1, 0.4)]));
        assert_eq!(
            generator.frequency_percentages(),
            Err(GeneratorError::InvalidDistribution(DistributionError::Incomplete))
        );
    }

    #[test]
    fn test_valid_numbers_and_percentages() {
        let generator = NumberGenerator::with_defaults(quiet());
        let mut sampler = Sampler::with_seed(11);
        let mut occurrences: BTreeMap<i64, u64> = (1..=5).map(|v| (v, 0)).collect();

        for _ in 0..100 {
            let value = generator.generate(&mut sampler).unwrap();
            assert!((1..6).contains(&value));
            *occurrences.get_mut(&value).unwrap() += 1;
        }

        let pct = generator.frequency_percentages().unwrap();
        assert_eq!(
            pct.keys().collect::<Vec<_>>(),
            occurrences.keys().collect::<Vec<_>>()
        );
        for (value, count) in occurrences {
            assert_eq!(pct[&value], (count as f64 / 100.0) * 100.0);
        }
    }

    #[test]
    fn test_window_after_overflow() {
        let generator = NumberGenerator::with_defaults(quiet());
        let mut sampler = Sampler::with_seed(2024);
        let mut window: VecDeque<i64> = VecDeque::with_capacity(100);

        for _ in 0..200 {
            let value = generator.generate(&mut sampler).unwrap();
            if window.len() == 100 {
                window.pop_front();
            }
            window.push_back(value);
        }

        assert_eq!(generator.queue_length(), 100);
        assert_eq!(generator.history().values(), window.iter().copied().collect::<Vec<_>>());

        let pct = generator.frequency_percentages().unwrap();
        for (value, _) in DEFAULT_CDF {
            let count = window.iter().filter(|v| **v == value).count();
            assert_eq!(pct[&value], (count as f64 / 100.0) * 100.0);
        }
    }

    #[test]
    fn test_new_values_are_tracked_after_replacement() {
        let generator = NumberGenerator::with_defaults(quiet());
        generator.set_cdf(&raw_entries(&[(10, 0.5), (20, 1.0)])).unwrap();

        let snapshot = generator.frequencies();
        assert_eq!(snapshot.counts().len(), 7);
        assert_eq!(snapshot.total(), 0);
    }
}
