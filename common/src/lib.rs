//! Shared model types and collaborator interfaces for the chunk store.
//!
//! This crate defines the vocabulary the index-resolution core is written
//! against: labels and matchers, index queries and entries, chunk references,
//! and the traits implemented by the backing index client, the schema
//! component, and the chunk fetcher. It also ships an in-memory index client
//! used by tests and development setups.

pub mod chunk;
pub mod index;
pub mod labels;
pub mod matchers;
pub mod schema;
pub mod serde;

pub use chunk::{Chunk, ChunkFetcher, ChunkFilterer, ChunkRef, FetchError, RequestChunkFilterer, TimeMs};
pub use index::{IndexClient, IndexEntry, IndexError, IndexQuery, QueryPagesCallback, ReadBatchIterator};
pub use labels::{Label, Labels, METRIC_NAME_LABEL};
pub use matchers::{MatchType, Matcher, MatcherError, ShardAnnotation, SHARD_LABEL};
pub use schema::{SchemaError, SeriesStoreSchema};
