//! Error types for scaling, indexing and recommendation.

use thiserror::Error;

/// Errors that can occur while building or querying the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The dataset itself could not be loaded or validated.
    #[error("dataset error: {0}")]
    Dataset(#[from] timbre_core::Error),

    /// A feature column has (numerically) zero variance and cannot be
    /// standardized.
    #[error("feature column {column} has zero variance")]
    ZeroVariance { column: &'static str },

    /// A scaler was asked to fit zero rows.
    #[error("cannot fit a scaler on an empty feature matrix")]
    EmptyMatrix,

    /// A feature value was NaN or infinite.
    #[error("non-finite value in feature column {column} at row {row}")]
    NonFinite { column: &'static str, row: usize },

    /// Dataset, feature matrix and index disagree on the number of rows.
    #[error("index has {index_rows} rows but the dataset has {dataset_rows}")]
    Misaligned {
        index_rows: usize,
        dataset_rows: usize,
    },

    /// A persisted index does not match the feature matrix of the dataset
    /// it is being paired with.
    #[error("persisted index was built from a different dataset (first mismatch at row {row})")]
    StaleArtifact { row: usize },

    /// The requested number of recommendations is outside `1..=max`.
    #[error("recommendation count must be between 1 and {max}, got {requested}")]
    InvalidCount { requested: usize, max: usize },

    /// The lookup key is empty or whitespace only.
    #[error("{mode} name must not be blank")]
    BlankKey { mode: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported index artifact version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt index artifact: {0}")]
    Corrupt(String),
}

impl SearchError {
    /// Returns `true` for errors caused by the caller's query arguments.
    ///
    /// These are rejected before the index is touched and never affect
    /// other queries.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidCount { .. } | Self::BlankKey { .. })
    }

    /// Returns `true` for errors that leave the engine unable to serve any
    /// query, i.e. everything that is not an invalid argument.
    pub fn is_fatal(&self) -> bool {
        !self.is_invalid_argument()
    }
}

/// Convenience alias for search results.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_classification() {
        let err = SearchError::InvalidCount {
            requested: 0,
            max: 20,
        };
        assert!(err.is_invalid_argument());
        assert!(!err.is_fatal());

        let err = SearchError::BlankKey { mode: "track" };
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "track name must not be blank");
    }

    #[test]
    fn test_data_errors_are_fatal() {
        let err = SearchError::ZeroVariance { column: "tempo" };
        assert!(err.is_fatal());

        let err = SearchError::from(timbre_core::Error::EmptyDataset);
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "dataset error: dataset contains no tracks");
    }
}
