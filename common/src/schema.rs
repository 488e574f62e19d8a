//! The schema component interface.
//!
//! The schema knows how series and chunks are laid out in the index for a
//! given time range and plans the concrete range scans a lookup needs. The
//! resolution core treats the returned queries as opaque.

use thiserror::Error;

use crate::chunk::TimeMs;
use crate::index::IndexQuery;
use crate::matchers::ShardAnnotation;

/// Errors surfaced by schema implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema has no label-name rows for series; callers fall back to
    /// scanning chunks.
    #[error("label names for series are not supported by this schema")]
    NotSupported,
    /// Query planning failed.
    #[error("schema query planning failed: {0}")]
    Query(String),
}

/// Plans index queries for series-store lookups.
pub trait SeriesStoreSchema: Send + Sync {
    /// Queries matching every series of a metric.
    fn read_queries_for_metric(
        &self,
        from: TimeMs,
        through: TimeMs,
        tenant: &str,
        metric_name: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError>;

    /// Queries matching every series of a metric carrying a label,
    /// regardless of its value.
    fn read_queries_for_metric_label(
        &self,
        from: TimeMs,
        through: TimeMs,
        tenant: &str,
        metric_name: &str,
        label_name: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError>;

    /// Queries matching series of a metric with an exact label value.
    fn read_queries_for_metric_label_value(
        &self,
        from: TimeMs,
        through: TimeMs,
        tenant: &str,
        metric_name: &str,
        label_name: &str,
        label_value: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError>;

    /// Queries returning the chunks of one series.
    fn chunks_for_series(
        &self,
        from: TimeMs,
        through: TimeMs,
        tenant: &str,
        series_id: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError>;

    /// Queries returning the label-name rows of one series.
    ///
    /// Schemas without label-name rows return
    /// [`SchemaError::NotSupported`].
    fn label_names_for_series(
        &self,
        from: TimeMs,
        through: TimeMs,
        tenant: &str,
        series_id: &str,
    ) -> Result<Vec<IndexQuery>, SchemaError>;

    /// Restricts planned queries to a shard, when one is given.
    fn filter_read_queries(
        &self,
        queries: Vec<IndexQuery>,
        shard: Option<&ShardAnnotation>,
    ) -> Vec<IndexQuery>;
}
