//! Error types
//!
//! Every fallible operation in the library returns one of these typed errors.
//! None of them cross a worker thread boundary as a panic: workers convert
//! them into a [`WorkerError`](crate::worker::WorkerError) recorded against
//! their own identifier.

use thiserror::Error;

/// Message reported for an empty (or missing) CDF table
pub const EMPTY_CDF_MESSAGE: &str = "Cdf must be non-empty list of tuples";

/// Message reported for every other malformed CDF table
pub const INVALID_CDF_MESSAGE: &str = "Cdf is invalid. Should consist of list of pairs of two \
     (<GENERATED_NUMBER>, <CUMULATIVE DISTRIBUTION>). List should be sorted by \
     <CUMULATIVE DISTRIBUTION> in ascending order and end at exactly 1.";

/// Reasons a CDF table fails validation
///
/// The `Display` output is the stable diagnostic message callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistributionError {
    /// No entries at all
    #[error("{}", EMPTY_CDF_MESSAGE)]
    Empty,

    /// An entry is not exactly a (value, probability) pair with an integral value
    #[error("{} (entry {index} is not a (value, probability) pair)", INVALID_CDF_MESSAGE)]
    MalformedEntry { index: usize },

    /// A cumulative probability lies outside [0, 1]
    #[error("{} (entry {index} has probability outside [0, 1])", INVALID_CDF_MESSAGE)]
    OutOfRange { index: usize },

    /// A cumulative probability is lower than its predecessor
    #[error("{} (entry {index} decreases the cumulative probability)", INVALID_CDF_MESSAGE)]
    NotMonotonic { index: usize },

    /// The accumulated probability mass exceeds 1
    #[error("{} (probability mass exceeds 1 at entry {index})", INVALID_CDF_MESSAGE)]
    MassExceeded { index: usize },

    /// The final cumulative probability falls short of 1
    #[error("{} (total probability mass is below 1)", INVALID_CDF_MESSAGE)]
    Incomplete,
}

/// Errors surfaced by [`NumberGenerator`](crate::generator::NumberGenerator)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// The configured table is invalid; sampling and reporting are refused
    #[error(transparent)]
    InvalidDistribution(#[from] DistributionError),

    /// Percentages were requested while the history holds no entries
    #[error("Zero division error: history is empty")]
    EmptyHistory,
}

/// Errors raised by the persistence collaborator
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination is not a usable string-like path
    #[error("invalid destination path: {0:?}")]
    InvalidDestination(std::path::PathBuf),

    /// The destination could not be opened or written
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_is_exact() {
        assert_eq!(
            DistributionError::Empty.to_string(),
            "Cdf must be non-empty list of tuples"
        );
    }

    #[test]
    fn test_invalid_messages_share_prefix() {
        let errors = [
            DistributionError::MalformedEntry { index: 1 },
            DistributionError::OutOfRange { index: 0 },
            DistributionError::NotMonotonic { index: 2 },
            DistributionError::MassExceeded { index: 3 },
            DistributionError::Incomplete,
        ];
        for err in errors {
            assert!(err.to_string().starts_with("Cdf is invalid."), "{}", err);
        }
    }

    #[test]
    fn test_generator_error_wraps_distribution_message() {
        let err = GeneratorError::from(DistributionError::Incomplete);
        assert!(err.to_string().contains("Cdf is invalid."));
    }
}
