//! Error types for the bloomwatch library.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for phenology operations.
pub type Result<T> = std::result::Result<T, PhenologyError>;

/// Errors that can occur while analysing vegetation-index series.
///
/// "Nothing found" outcomes (no bloom, no prediction) are reported as
/// `Ok(None)` by the operations, never as one of these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhenologyError {
    /// Fewer samples than the algorithm requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Fewer historical points than variance-based statistics require.
    #[error("insufficient history: need at least {needed} records, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// Malformed or inverted date range, or out-of-bounds coordinates.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model must be fitted before prediction.
    #[error("model must be fitted before predicting")]
    FitRequired,

    /// A sample carried a NaN or infinite index value.
    #[error("non-finite vegetation index on {date}")]
    NonFiniteValue { date: NaiveDate },

    /// An external data collaborator failed.
    #[error("data source error: {0}")]
    Source(String),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = PhenologyError::InsufficientData { needed: 3, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 3, got 1");

        let err = PhenologyError::InsufficientHistory { needed: 2, got: 1 };
        assert_eq!(
            err.to_string(),
            "insufficient history: need at least 2 records, got 1"
        );

        let err = PhenologyError::InvalidRange("start after end".to_string());
        assert_eq!(err.to_string(), "invalid range: start after end");

        let date = NaiveDate::from_ymd_opt(2024, 4, 9).unwrap();
        let err = PhenologyError::NonFiniteValue { date };
        assert_eq!(err.to_string(), "non-finite vegetation index on 2024-04-09");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = PhenologyError::Source("timeout".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
