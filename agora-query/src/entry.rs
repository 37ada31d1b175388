//! Caller-owned snapshots of cache slots.

use crate::key::QueryKey;
use agora_core::{AgoraError, Timestamp};
use std::sync::Arc;

/// Lifecycle state of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Never fetched (or the read is disabled).
    Idle,
    /// A fetch is in flight. Previous data, if any, is still attached.
    Loading,
    Success,
    /// The last fetch failed. Previous data, if any, is retained.
    Error,
}

/// Snapshot of one cache slot at the moment of a read.
///
/// The cache owns the authoritative slot; this copy never changes after it is
/// returned.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: QueryKey,
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<AgoraError>,
    pub last_fetched_at: Option<Timestamp>,
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            is_stale: self.is_stale,
            is_fetching: self.is_fetching,
        }
    }
}

impl<T> CacheEntry<T> {
    pub(crate) fn idle(key: QueryKey) -> Self {
        Self {
            key,
            data: None,
            status: QueryStatus::Idle,
            error: None,
            last_fetched_at: None,
            is_stale: true,
            is_fetching: false,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    /// Nothing to show yet: a first fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}
