//! The backing key-range index interface.
//!
//! The index stores rows grouped by `(table, hash key)` and ordered by range
//! bytes within a group. Clients answer small range scans; the resolution
//! core issues many of them and folds the results together.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod in_memory;

/// A single range scan against the index.
///
/// Produced by the schema component; opaque to the resolution core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    /// Table to scan.
    pub table_name: String,
    /// Hash key selecting the row group.
    pub hash_value: String,
    /// Optional prefix the row's range bytes must start with.
    pub range_value_prefix: Option<Bytes>,
    /// Optional exact match on the row's value bytes.
    pub value_equal: Option<Bytes>,
}

impl IndexQuery {
    /// Creates a query scanning a whole row group.
    pub fn new(table_name: impl Into<String>, hash_value: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_value: hash_value.into(),
            range_value_prefix: None,
            value_equal: None,
        }
    }

    /// Restricts the scan to rows whose range bytes start with `prefix`.
    pub fn with_range_prefix(mut self, prefix: Bytes) -> Self {
        self.range_value_prefix = Some(prefix);
        self
    }

    /// Restricts the scan to rows whose value bytes equal `value`.
    pub fn with_value_equal(mut self, value: Bytes) -> Self {
        self.value_equal = Some(value);
        self
    }
}

/// A single row returned by an index scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub table_name: String,
    pub hash_value: String,
    pub range_value: Bytes,
    pub value: Bytes,
}

/// Iterator over the rows of one response batch.
///
/// Yields `(range_value, value)` pairs.
pub trait ReadBatchIterator: Send {
    fn next_row(&mut self) -> Option<(Bytes, Bytes)>;
}

/// Callback invoked per response batch during a paginated scan.
///
/// Returns `true` to continue the scan for that query. Clients may invoke
/// the callback concurrently from multiple workers, so implementations must
/// guard any shared state.
pub type QueryPagesCallback<'a> =
    &'a (dyn Fn(&IndexQuery, &mut dyn ReadBatchIterator) -> bool + Send + Sync);

/// Errors surfaced by index clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A scan would return more series than the configured safety bound.
    ///
    /// Clients raise this with empty metric/label fields; the resolution
    /// core annotates them before surfacing the error.
    #[error("cardinality limit exceeded for {metric_name}{{{label_name}}}: {size} entries, limit {limit}")]
    CardinalityExceeded {
        metric_name: String,
        label_name: String,
        size: usize,
        limit: usize,
    },
    /// The scan failed in the backing store.
    #[error("index query failed: {0}")]
    Query(String),
}

/// A paginated index client.
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Runs the given queries, streaming matching rows to `callback`.
    ///
    /// The callback may be invoked concurrently from multiple workers and
    /// receives one batch at a time per query.
    async fn query_pages(
        &self,
        queries: &[IndexQuery],
        callback: QueryPagesCallback<'_>,
    ) -> Result<(), IndexError>;
}
