//! Frequency reporting
//!
//! Percentages are derived from a [`FrequencySnapshot`] copied out of the
//! history under its lock, so the division happens outside the critical
//! section and always sees a length that matches the counts.

use super::BoundedHistory;
use crate::error::GeneratorError;
use serde::Serialize;
use std::collections::BTreeMap;

/// History length and per-value counts taken at the same instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencySnapshot {
    len: usize,
    counts: BTreeMap<i64, u64>,
}

impl FrequencySnapshot {
    pub fn new(len: usize, counts: BTreeMap<i64, u64>) -> Self {
        Self { len, counts }
    }

    /// History length at snapshot time
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn counts(&self) -> &BTreeMap<i64, u64> {
        &self.counts
    }

    /// Count for `value` (0 if untracked)
    pub fn count(&self, value: i64) -> u64 {
        self.counts.get(&value).copied().unwrap_or(0)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Percentage of the history held by each tracked value
    ///
    /// # Errors
    ///
    /// [`GeneratorError::EmptyHistory`] when the snapshot holds no entries;
    /// no partial result is returned.
    pub fn percentages(&self) -> Result<BTreeMap<i64, f64>, GeneratorError> {
        if self.len == 0 {
            return Err(GeneratorError::EmptyHistory);
        }
        let len = self.len as f64;
        Ok(self
            .counts
            .iter()
            .map(|(&value, &count)| (value, (count as f64 / len) * 100.0))
            .collect())
    }
}

/// Derives percentage distributions from a history
pub struct FrequencyReporter;

impl FrequencyReporter {
    /// Percentage per tracked value of the history's current contents
    pub fn percentages(history: &BoundedHistory) -> Result<BTreeMap<i64, f64>, GeneratorError> {
        history.snapshot().percentages()
    }
}
