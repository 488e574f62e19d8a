//! Reusable entry buffers.
//!
//! Every index lookup collects rows into a scratch `Vec<IndexEntry>`. The
//! pool keeps cleared buffers around so repeated lookups reuse their
//! capacity instead of reallocating. Buffers are handed out through an RAII
//! guard, so they return to the pool on every exit path. The pool is an
//! optimization; nothing depends on reuse actually happening.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::index::IndexEntry;

const INITIAL_CAPACITY: usize = 1024;
const MAX_POOLED: usize = 64;

/// A pool of cleared `Vec<IndexEntry>` buffers.
pub(crate) struct EntryPool {
    free: Mutex<Vec<Vec<IndexEntry>>>,
    in_use: AtomicUsize,
}

impl EntryPool {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            free: Mutex::new(Vec::new()),
            in_use: AtomicUsize::new(0),
        })
    }

    /// Acquires a zero-length buffer with retained capacity.
    pub(crate) fn get(self: &Arc<Self>) -> PooledEntries {
        let buf = self
            .free
            .lock()
            .expect("lock poisoned")
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        self.in_use.fetch_add(1, Ordering::Relaxed);
        PooledEntries {
            pool: Arc::clone(self),
            buf,
        }
    }

    fn put(&self, mut buf: Vec<IndexEntry>) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);
        buf.clear();
        let mut free = self.free.lock().expect("lock poisoned");
        if free.len() < MAX_POOLED {
            free.push(buf);
        }
    }

    /// Number of buffers currently handed out.
    #[cfg(test)]
    pub(crate) fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    fn pooled(&self) -> usize {
        self.free.lock().expect("lock poisoned").len()
    }
}

/// A pooled entry buffer, returned to its pool on drop.
pub(crate) struct PooledEntries {
    pool: Arc<EntryPool>,
    buf: Vec<IndexEntry>,
}

impl Deref for PooledEntries {
    type Target = Vec<IndexEntry>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledEntries {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledEntries {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
