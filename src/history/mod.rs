//! Bounded history of sampled values
//!
//! [`BoundedHistory`] is a fixed-capacity FIFO of `(value, timestamp)`
//! entries together with a per-value occurrence count. Both live behind one
//! mutex, so appending (and evicting the oldest entry when full) updates the
//! sequence and the counts in a single critical section. Readers take the
//! same lock and copy out what they need.
//!
//! # Invariant
//!
//! For every tracked value, its count equals the number of occurrences of
//! that value in the sequence. In particular the counts always sum to the
//! sequence length.
//!
//! # Example
//!
//! ```
//! use cdfgen::history::{BoundedHistory, Capacity};
//!
//! let history = BoundedHistory::new(Capacity::bounded(2), [1, 2]);
//! history.append(1);
//! history.append(2);
//! history.append(2);
//!
//! assert_eq!(history.len(), 2);
//! assert_eq!(history.values(), vec![2, 2]);
//! assert_eq!(history.snapshot().count(1), 0);
//! ```

pub mod frequency;

use crate::diagnostics::Diagnostics;
use crate::util::time::unix_timestamp;
use frequency::FrequencySnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Maximum number of entries a history keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Oldest entry is evicted once this many entries are held
    Bounded(NonZeroUsize),
    /// Never evicts (fallback for unusable settings)
    Unbounded,
}

impl Capacity {
    /// Bounded capacity, or unbounded for zero
    pub fn bounded(len: usize) -> Self {
        NonZeroUsize::new(len).map_or(Capacity::Unbounded, Capacity::Bounded)
    }

    /// Interpret a configured length
    ///
    /// # Errors
    ///
    /// Returns the fallback reason when the length is not positive.
    pub fn from_len(len: i64) -> Result<Self, CapacityFallback> {
        usize::try_from(len)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Capacity::Bounded)
            .ok_or(CapacityFallback::NotPositive(len))
    }

    /// Interpret a configuration setting
    pub fn from_setting(setting: &CapacitySetting) -> Result<Self, CapacityFallback> {
        match setting {
            CapacitySetting::Length(len) => Self::from_len(*len),
            CapacitySetting::Other(value) => Err(CapacityFallback::NotAnInteger(value.to_string())),
        }
    }

    /// Interpret a setting, falling back to unbounded and reporting why
    pub fn resolve(setting: &CapacitySetting, diagnostics: &dyn Diagnostics) -> Self {
        Self::from_setting(setting).unwrap_or_else(|reason| {
            diagnostics.degraded("history", &format!("{}; history is unbounded", reason));
            Capacity::Unbounded
        })
    }

    /// Entry limit, `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            Capacity::Bounded(n) => Some(n.get()),
            Capacity::Unbounded => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Capacity::Bounded(_))
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Bounded(n) => write!(f, "{}", n),
            Capacity::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Why a capacity setting degraded to unbounded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityFallback {
    /// Zero or negative length
    NotPositive(i64),
    /// Not an integer at all (text, fraction, boolean, ...)
    NotAnInteger(String),
}

impl fmt::Display for CapacityFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityFallback::NotPositive(len) => {
                write!(f, "capacity must be a positive integer, got {}", len)
            }
            CapacityFallback::NotAnInteger(raw) => {
                write!(f, "capacity must be an integer, got {}", raw)
            }
        }
    }
}

/// Capacity as it appears in configuration
///
/// Accepts any value so that an unusable setting degrades instead of
/// failing the whole configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacitySetting {
    Length(i64),
    Other(serde_json::Value),
}

impl Default for CapacitySetting {
    fn default() -> Self {
        CapacitySetting::Length(crate::distribution::DEFAULT_CAPACITY)
    }
}

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub value: i64,
    /// Seconds since the Unix epoch at append time
    pub timestamp: f64,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: VecDeque<HistoryEntry>,
    frequencies: BTreeMap<i64, u64>,
}

/// Thread-safe bounded FIFO with incremental frequency counts
#[derive(Debug)]
pub struct BoundedHistory {
    capacity: Capacity,
    state: Mutex<HistoryState>,
}

impl BoundedHistory {
    /// Create an empty history tracking `values` with zero counts
    pub fn new(capacity: Capacity, values: impl IntoIterator<Item = i64>) -> Self {
        let frequencies = values.into_iter().map(|v| (v, 0)).collect();
        let entries = match capacity.limit() {
            Some(limit) => VecDeque::with_capacity(limit),
            None => VecDeque::new(),
        };
        Self {
            capacity,
            state: Mutex::new(HistoryState {
                entries,
                frequencies,
            }),
        }
    }

    /// Create a history from a configuration setting
    ///
    /// An unusable setting is reported to `diagnostics` and yields an
    /// unbounded history.
    pub fn from_setting(
        setting: &CapacitySetting,
        values: impl IntoIterator<Item = i64>,
        diagnostics: &dyn Diagnostics,
    ) -> Self {
        Self::new(Capacity::resolve(setting, diagnostics), values)
    }

    // The critical sections below never panic mid-update, so a poisoned lock
    // still guards a consistent state.
    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a value stamped with the current time
    ///
    /// When full, the oldest entry is evicted and its count decremented in
    /// the same critical section as the increment for `value`.
    pub fn append(&self, value: i64) -> HistoryEntry {
        let mut state = self.lock();
        let entry = HistoryEntry {
            value,
            timestamp: unix_timestamp(),
        };
        self.push_locked(&mut state, entry);
        entry
    }

    /// Append an entry with a caller-supplied timestamp
    pub fn append_entry(&self, entry: HistoryEntry) {
        let mut state = self.lock();
        self.push_locked(&mut state, entry);
    }

    fn push_locked(&self, state: &mut HistoryState, entry: HistoryEntry) {
        if let Some(limit) = self.capacity.limit() {
            if state.entries.len() == limit {
                if let Some(evicted) = state.entries.pop_front() {
                    if let Some(count) = state.frequencies.get_mut(&evicted.value) {
                        *count -= 1;
                    }
                }
            }
        }
        state.entries.push_back(entry);
        *state.frequencies.entry(entry.value).or_insert(0) += 1;
    }

    /// Start tracking `values` (zero count) without touching existing counts
    pub fn track(&self, values: impl IntoIterator<Item = i64>) {
        let mut state = self.lock();
        for value in values {
            state.frequencies.entry(value).or_insert(0);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Configured capacity (fixed for the lifetime of the history)
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Most recently appended entry
    pub fn last_entry(&self) -> Option<HistoryEntry> {
        self.lock().entries.back().copied()
    }

    /// Copy of all entries, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().entries.iter().copied().collect()
    }

    /// Copy of all values, oldest first
    pub fn values(&self) -> Vec<i64> {
        self.lock().entries.iter().map(|e| e.value).collect()
    }

    /// Length and counts taken from one consistent state
    pub fn snapshot(&self) -> FrequencySnapshot {
        let state = self.lock();
        FrequencySnapshot::new(state.entries.len(), state.frequencies.clone())
    }
}
