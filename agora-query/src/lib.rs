//! Agora Query - Server-State Cache
//!
//! A key-addressed cache of server query results with explicit freshness,
//! request de-duplication, and invalidation after mutations.
//!
//! ```ignore
//! let cache = QueryCache::new(CacheConfig::default());
//!
//! // Render whatever is cached; a fetch starts in the background if needed.
//! let entry = cache.read(keys::post(&id), move || api.get_post(id.clone()), ReadOptions::default())?;
//!
//! // Mutate, then refetch the affected keys.
//! cache.mutate(api.upvote(&id), &[keys::post(&id), keys::posts()]).await?;
//! ```

pub mod cache;
pub mod entry;
pub mod freshness;
pub mod key;
pub mod observer;
pub mod stats;

pub use cache::{CacheConfig, QueryCache};
pub use entry::{CacheEntry, QueryStatus};
pub use freshness::{Freshness, ReadOptions};
pub use key::{KeyPart, QueryKey, Resource};
pub use observer::QueryObserver;
pub use stats::CacheStats;
