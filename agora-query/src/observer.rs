//! Mounted consumers of a query.

use crate::cache::CacheInner;
use crate::key::QueryKey;
use std::sync::Weak;
use tokio::sync::watch;

/// A registered consumer of one key.
///
/// While any observer of a key is alive, invalidating the key refetches it
/// immediately and the entry is exempt from garbage collection. Dropping the
/// observer unregisters it; it sees no further changes.
#[derive(Debug)]
pub struct QueryObserver {
    key: QueryKey,
    cache: Weak<CacheInner>,
    receiver: watch::Receiver<u64>,
}

impl QueryObserver {
    pub(crate) fn new(key: QueryKey, cache: Weak<CacheInner>, receiver: watch::Receiver<u64>) -> Self {
        Self {
            key,
            cache,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Wait for the entry to change. Returns `false` once the entry is gone
    /// (evicted or the cache shut down).
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Whether a change arrived since the last [`changed`](Self::changed).
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Monotonic change counter of the entry.
    pub fn version(&self) -> u64 {
        *self.receiver.borrow()
    }
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.release_observer(&self.key);
        }
    }
}
