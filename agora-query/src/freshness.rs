//! Freshness contracts for cache reads.
//!
//! Every read states how old cached data may be before it is refetched.
//! Invalidation overrides both modes: an invalidated entry is always stale.

use std::time::Duration;

/// Staleness tolerance of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Cached data is served while younger than `max_staleness`.
    BestEffort { max_staleness: Duration },

    /// Cached data is trusted until a mutation invalidates it.
    #[default]
    Consistent,
}

impl Freshness {
    pub fn best_effort(max_staleness: Duration) -> Self {
        Self::BestEffort { max_staleness }
    }

    pub fn consistent() -> Self {
        Self::Consistent
    }

    /// Whether data fetched `age` ago has outlived this tolerance.
    pub fn is_expired(&self, age: Duration) -> bool {
        match self {
            Self::BestEffort { max_staleness } => age > *max_staleness,
            Self::Consistent => false,
        }
    }
}

/// Per-read options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Overrides the cache-wide default when set.
    pub freshness: Option<Freshness>,
    /// A disabled read never fetches.
    pub enabled: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            freshness: None,
            enabled: true,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = Some(freshness);
        self
    }

    /// Enable the read only when `enabled` holds, e.g. once a session exists.
    pub fn enabled_if(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
