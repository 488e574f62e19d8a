//! Error taxonomy for store operations.

use common::chunk::{FetchError, InvalidChunkKey};
use common::index::IndexError;
use common::matchers::MatcherError;
use common::schema::SchemaError;
use common::serde::EncodingError;
use thiserror::Error;

/// Error type for series index store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The query carried no equality matcher on the metric-name label.
    #[error("query must contain a metric name matcher")]
    MissingMetricName,

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// Index client failure, including cardinality-bound violations.
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An index entry failed to decode; the index is corrupt.
    #[error("corrupt index entry: {0}")]
    Entry(#[from] EncodingError),

    /// A chunk key failed to parse; the index is corrupt.
    #[error(transparent)]
    ChunkKey(#[from] InvalidChunkKey),

    /// A matcher lookup task failed to complete.
    #[error("matcher lookup task failed: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for cardinality-bound violations, which are recoverable
    /// during matcher fanout.
    pub fn is_cardinality_exceeded(&self) -> bool {
        matches!(
            self,
            Error::Index(IndexError::CardinalityExceeded { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
