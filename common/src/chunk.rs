//! Chunk references and the chunk fetcher interface.
//!
//! A chunk is a time-bounded block of log/metric data for one series. The
//! resolution core only handles chunk *references*: the metadata needed to
//! identify a chunk without its bytes. References round-trip through an
//! external key, which is also the cache key used when fetching.

use async_trait::async_trait;
use thiserror::Error;

use crate::labels::Labels;

/// Timestamps are millisecond ticks since the Unix epoch.
pub type TimeMs = i64;

/// Error raised when an external chunk key cannot be parsed.
///
/// Chunk keys come out of index rows, so a malformed key indicates index
/// corruption and is fatal for the request that observed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid chunk key {key:?}: {reason}")]
pub struct InvalidChunkKey {
    pub key: String,
    pub reason: String,
}

impl InvalidChunkKey {
    fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Metadata identifying a chunk without its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkRef {
    pub tenant: String,
    /// Fingerprint of the series this chunk belongs to.
    pub fingerprint: u64,
    pub from: TimeMs,
    pub through: TimeMs,
    pub checksum: u32,
}

impl ChunkRef {
    /// Formats this reference as its external key:
    /// `tenant/fingerprint:from:through:checksum`, numbers in hex.
    pub fn external_key(&self) -> String {
        format!(
            "{}/{:x}:{:x}:{:x}:{:x}",
            self.tenant, self.fingerprint, self.from as u64, self.through as u64, self.checksum
        )
    }

    /// Parses an external key, validating it belongs to `tenant`.
    pub fn parse_external_key(tenant: &str, key: &str) -> Result<ChunkRef, InvalidChunkKey> {
        let (key_tenant, rest) = key
            .split_once('/')
            .ok_or_else(|| InvalidChunkKey::new(key, "missing tenant separator"))?;
        if key_tenant != tenant {
            return Err(InvalidChunkKey::new(key, "tenant mismatch"));
        }
        let mut parts = rest.split(':');
        let mut next_hex = |what: &str| {
            parts
                .next()
                .ok_or_else(|| InvalidChunkKey::new(key, format!("missing {}", what)))
                .and_then(|part| {
                    u64::from_str_radix(part, 16)
                        .map_err(|_| InvalidChunkKey::new(key, format!("invalid {}", what)))
                })
        };
        let fingerprint = next_hex("fingerprint")?;
        let from = next_hex("from")? as TimeMs;
        let through = next_hex("through")? as TimeMs;
        let checksum = next_hex("checksum")?;
        let checksum = u32::try_from(checksum)
            .map_err(|_| InvalidChunkKey::new(key, "checksum out of range"))?;
        if parts.next().is_some() {
            return Err(InvalidChunkKey::new(key, "trailing fields"));
        }
        Ok(ChunkRef {
            tenant: tenant.to_string(),
            fingerprint,
            from,
            through,
            checksum,
        })
    }

    /// Returns true if this chunk overlaps the closed interval
    /// `[from, through]`.
    pub fn overlaps(&self, from: TimeMs, through: TimeMs) -> bool {
        self.through >= from && self.from <= through
    }
}

/// A chunk reference together with the series label set.
///
/// Labels are empty until the chunk has been materialized by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_ref: ChunkRef,
    pub labels: Labels,
}

impl Chunk {
    /// Wraps a reference into an unfetched chunk.
    pub fn from_ref(chunk_ref: ChunkRef) -> Self {
        Self {
            chunk_ref,
            labels: Labels::default(),
        }
    }
}

/// Error surfaced by chunk fetchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chunk fetch failed: {0}")]
pub struct FetchError(pub String);

/// Materializes chunks from the object store or cache.
#[async_trait]
pub trait ChunkFetcher: Send + Sync {
    /// Fetches the given chunks, keyed by their external keys.
    ///
    /// `keys` parallels `chunks` and must be sorted ascending; batched cache
    /// lookups rely on that order.
    async fn fetch_chunks(
        &self,
        chunks: Vec<Chunk>,
        keys: Vec<String>,
    ) -> Result<Vec<Chunk>, FetchError>;
}

/// Per-request chunk filter.
pub trait ChunkFilterer: Send {
    /// Returns true if a chunk with these labels should be dropped.
    fn should_filter(&self, labels: &Labels) -> bool;
}

/// Factory binding a [`ChunkFilterer`] to a single request.
pub trait RequestChunkFilterer: Send + Sync {
    fn for_request(&self) -> Box<dyn ChunkFilterer>;
}
