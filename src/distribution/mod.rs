//! Discrete distributions described by a cumulative distribution table
//!
//! A [`CdfTable`] is an ordered list of `(value, cumulative probability)`
//! entries. The table is validated once when it is built and is immutable
//! afterwards; reconfiguring a generator replaces the whole table.
//!
//! # Validation
//!
//! A table is accepted when:
//!
//! - it has at least one entry
//! - every entry is exactly a `(value, probability)` pair with an integral value
//! - every probability lies in `[0, 1]`
//! - probabilities never decrease
//! - the accumulated mass (sum of successive deltas starting from 0) never
//!   exceeds 1 and finally reaches exactly 1
//!
//! An invalid table is not an error at construction time. It is kept, empty
//! and tagged with the reason, so every later sampling attempt can report it.
//!
//! # Example
//!
//! ```
//! use cdfgen::distribution::CdfTable;
//!
//! let table = CdfTable::from_pairs(&[(1, 0.5), (2, 1.0)]);
//! assert!(table.is_valid());
//!
//! let bad = CdfTable::from_pairs(&[(1, 0.4), (2, 0.6)]);
//! assert!(!bad.is_valid());
//! assert!(bad.message().unwrap().contains("Cdf is invalid."));
//! ```

pub mod sampler;

use crate::error::DistributionError;
use serde::{Deserialize, Serialize};

/// Table used when no distribution is configured
pub const DEFAULT_CDF: [(i64, f64); 5] = [(1, 0.5), (2, 0.75), (3, 0.9), (4, 0.95), (5, 1.0)];

/// History capacity used when none is configured
pub const DEFAULT_CAPACITY: i64 = 100;

/// One field of a raw table row
///
/// Integers stay integers so large values survive unchanged; only a float in
/// the value position has to be checked for integrality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Int(i64),
    Float(f64),
}

impl RawField {
    fn as_value(self) -> Option<i64> {
        match self {
            RawField::Int(v) => Some(v),
            RawField::Float(v) => {
                let integral = v.is_finite()
                    && v.fract() == 0.0
                    && v >= i64::MIN as f64
                    && v < i64::MAX as f64;
                integral.then_some(v as i64)
            }
        }
    }

    fn as_probability(self) -> f64 {
        match self {
            RawField::Int(p) => p as f64,
            RawField::Float(p) => p,
        }
    }
}

impl From<i64> for RawField {
    fn from(v: i64) -> Self {
        RawField::Int(v)
    }
}

impl From<f64> for RawField {
    fn from(v: f64) -> Self {
        RawField::Float(v)
    }
}

/// One table row as read from configuration, before any shape checks
///
/// Configuration files carry rows as plain number lists (`[2, 0.75]`), so a
/// row may have the wrong number of fields or a non-integral value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEntry(pub Vec<RawField>);

impl RawEntry {
    pub fn pair(value: i64, probability: f64) -> Self {
        Self(vec![RawField::Int(value), RawField::Float(probability)])
    }

    /// Interpret the row as a `(value, probability)` pair
    ///
    /// Returns `None` unless the row has exactly two fields and the first is
    /// an integer, or a finite integral float representable as `i64`.
    pub fn as_pair(&self) -> Option<(i64, f64)> {
        match self.0.as_slice() {
            [value, probability] => Some((value.as_value()?, probability.as_probability())),
            _ => None,
        }
    }
}

/// Build raw rows from typed pairs
pub fn raw_entries(pairs: &[(i64, f64)]) -> Vec<RawEntry> {
    pairs.iter().map(|&(v, p)| RawEntry::pair(v, p)).collect()
}

/// A validated table row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CdfEntry {
    /// Value emitted when a draw falls into this bucket
    pub value: i64,
    /// Cumulative probability up to and including this value
    pub cumulative: f64,
}

/// Cumulative distribution table
#[derive(Debug, Clone, PartialEq)]
pub struct CdfTable {
    entries: Vec<CdfEntry>,
    status: Result<(), DistributionError>,
}

impl CdfTable {
    /// Validate raw rows and build a table
    ///
    /// Never fails: an invalid input yields an empty table tagged with the
    /// reason (see [`CdfTable::error`]).
    pub fn new(raw: &[RawEntry]) -> Self {
        Self::from_rows(raw.iter().map(RawEntry::as_pair))
    }

    /// Build a table from typed pairs
    pub fn from_pairs(pairs: &[(i64, f64)]) -> Self {
        Self::from_rows(pairs.iter().copied().map(Some))
    }

    /// The default five-value table
    pub fn default_table() -> Self {
        Self::from_pairs(&DEFAULT_CDF)
    }

    /// Validate raw rows without building a table
    ///
    /// Returns the diagnostic for the first violated rule.
    pub fn validate(raw: &[RawEntry]) -> Result<(), DistributionError> {
        check(raw.iter().map(RawEntry::as_pair)).map(|_| ())
    }

    fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Option<(i64, f64)>>,
    {
        match check(rows) {
            Ok(entries) => Self {
                entries,
                status: Ok(()),
            },
            Err(e) => Self {
                entries: Vec::new(),
                status: Err(e),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_ok()
    }

    /// Reason the table was rejected, if it was
    pub fn error(&self) -> Option<DistributionError> {
        self.status.err()
    }

    /// Stable diagnostic message for a rejected table
    pub fn message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    /// `Ok(())` for a valid table, otherwise the rejection reason
    pub fn status(&self) -> Result<(), DistributionError> {
        self.status
    }

    /// Validated entries (empty for an invalid table)
    pub fn entries(&self) -> &[CdfEntry] {
        &self.entries
    }

    /// Emitted values in table order
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CdfTable {
    fn default() -> Self {
        Self::default_table()
    }
}

/// Sum-of-deltas validation over optional pairs (`None` marks a malformed row)
fn check<I>(rows: I) -> Result<Vec<CdfEntry>, DistributionError>
where
    I: IntoIterator<Item = Option<(i64, f64)>>,
{
    let mut entries = Vec::new();
    let mut mass = 0.0_f64;
    let mut current = 0.0_f64;

    for (index, row) in rows.into_iter().enumerate() {
        let (value, probability) = row.ok_or(DistributionError::MalformedEntry { index })?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(DistributionError::OutOfRange { index });
        }
        if probability < current {
            return Err(DistributionError::NotMonotonic { index });
        }

        mass += (probability - current).abs();
        if mass > 1.0 {
            return Err(DistributionError::MassExceeded { index });
        }
        current = probability;

        entries.push(CdfEntry {
            value,
            cumulative: probability,
        });
    }

    if entries.is_empty() {
        return Err(DistributionError::Empty);
    }
    if mass < 1.0 {
        return Err(DistributionError::Incomplete);
    }

    Ok(entries)
}
