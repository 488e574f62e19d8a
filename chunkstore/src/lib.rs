//! Index-resolution core of the chunk store.
//!
//! The store translates high-level series queries (a metric name plus label
//! matchers over a time window, scoped to a tenant) into chunk references,
//! distinct series label sets, or label name/value enumerations. It does so
//! by planning many small index scans through the schema component, fanning
//! them out concurrently against the index client, parsing the returned
//! rows, and intersecting and deduplicating the results.
//!
//! # Architecture
//!
//! Per matcher, the store asks the schema for the index queries answering
//! that matcher, executes them through the index client into a pooled entry
//! buffer, and parses the entries into a sorted series-ID list. Series-ID
//! lists from concurrent matcher lookups are intersected as they arrive. A
//! matcher whose scan trips the index's cardinality bound does not abort the
//! fanout: as long as one matcher produced a bounded set, residual matching
//! at the chunk stage handles the rest.
//!
//! Resolved series IDs are mapped to chunk references through per-series
//! chunk queries, time-filtered, and either returned directly
//! ([`SeriesIndexStore::get_chunk_refs`]) or materialized into label sets by
//! fetching one chunk per series fingerprint
//! ([`SeriesIndexStore::get_series`]).
//!
//! # Example
//!
//! ```ignore
//! use chunkstore::{Config, SeriesIndexStore, StoreMetrics};
//! use common::{Matcher, METRIC_NAME_LABEL};
//!
//! let store = SeriesIndexStore::new(Config::default(), schema, index, fetcher, metrics);
//! let refs = store
//!     .get_chunk_refs(
//!         "tenant-1",
//!         from,
//!         through,
//!         &[
//!             Matcher::equal(METRIC_NAME_LABEL, "logs"),
//!             Matcher::equal("job", "api"),
//!         ],
//!     )
//!     .await?;
//! ```

mod config;
mod entries;
mod error;
mod lookup;
mod metrics;
mod pool;
mod set_matches;
mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use metrics::StoreMetrics;
pub use store::SeriesIndexStore;
