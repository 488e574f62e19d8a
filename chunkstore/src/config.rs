//! Configuration for the series index store.

use serde::{Deserialize, Serialize};

/// Configuration for a [`SeriesIndexStore`](crate::SeriesIndexStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Number of chunks fetched per batch during series materialization.
    ///
    /// `get_series` downloads one chunk per distinct series fingerprint to
    /// recover label sets. Fetches are issued in groups of this size, each
    /// group sorted by external chunk key so batched cache lookups line up.
    #[serde(default = "default_chunk_batch_size")]
    pub chunk_batch_size: usize,
}

fn default_chunk_batch_size() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_batch_size: default_chunk_batch_size(),
        }
    }
}
