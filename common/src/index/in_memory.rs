//! In-memory index client.
//!
//! Backs tests and development setups. Rows live in a sorted map per
//! `(table, hash)` group, scans honor the query's range prefix and
//! value-equality filters, and results are delivered to the callback in
//! pages of a configurable size.
//!
//! The interface permits concurrent callback invocations; this
//! implementation delivers batches sequentially, which is always a valid
//! schedule.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{IndexClient, IndexError, IndexQuery, QueryPagesCallback, ReadBatchIterator};

const DEFAULT_PAGE_SIZE: usize = 100;

/// An in-memory [`IndexClient`].
pub struct InMemoryIndex {
    rows: RwLock<BTreeMap<(String, String), BTreeMap<Bytes, Bytes>>>,
    page_size: usize,
    cardinality_limit: Option<usize>,
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            cardinality_limit: None,
        }
    }

    /// Sets the number of rows delivered per callback invocation.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        self.page_size = page_size;
        self
    }

    /// Fails any single query matching more than `limit` rows with
    /// [`IndexError::CardinalityExceeded`].
    pub fn with_cardinality_limit(mut self, limit: usize) -> Self {
        self.cardinality_limit = Some(limit);
        self
    }

    /// Inserts a row. Rows with equal `(table, hash, range)` overwrite.
    pub fn add(
        &self,
        table: impl Into<String>,
        hash: impl Into<String>,
        range_value: Bytes,
        value: Bytes,
    ) {
        self.rows
            .write()
            .expect("lock poisoned")
            .entry((table.into(), hash.into()))
            .or_default()
            .insert(range_value, value);
    }

    fn matching_rows(&self, query: &IndexQuery) -> Vec<(Bytes, Bytes)> {
        let rows = self.rows.read().expect("lock poisoned");
        let Some(group) = rows.get(&(query.table_name.clone(), query.hash_value.clone())) else {
            return Vec::new();
        };
        group
            .iter()
            .filter(|(range, value)| {
                if let Some(prefix) = &query.range_value_prefix {
                    if !range.starts_with(prefix) {
                        return false;
                    }
                }
                if let Some(expected) = &query.value_equal {
                    if value != &expected {
                        return false;
                    }
                }
                true
            })
            .map(|(range, value)| (range.clone(), value.clone()))
            .collect()
    }
}

struct VecBatch {
    rows: std::vec::IntoIter<(Bytes, Bytes)>,
}

impl ReadBatchIterator for VecBatch {
    fn next_row(&mut self) -> Option<(Bytes, Bytes)> {
        self.rows.next()
    }
}

#[async_trait]
impl IndexClient for InMemoryIndex {
    async fn query_pages(
        &self,
        queries: &[IndexQuery],
        callback: QueryPagesCallback<'_>,
    ) -> Result<(), IndexError> {
        for query in queries {
            let matches = self.matching_rows(query);
            if let Some(limit) = self.cardinality_limit {
                if matches.len() > limit {
                    return Err(IndexError::CardinalityExceeded {
                        metric_name: String::new(),
                        label_name: String::new(),
                        size: matches.len(),
                        limit,
                    });
                }
            }
            let mut remaining = matches;
            while !remaining.is_empty() {
                let rest = remaining.split_off(remaining.len().min(self.page_size));
                let mut batch = VecBatch {
                    rows: remaining.into_iter(),
                };
                if !callback(query, &mut batch) {
                    break;
                }
                remaining = rest;
            }
        }
        Ok(())
    }
}
