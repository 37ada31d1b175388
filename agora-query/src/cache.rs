//! The server-state cache.
//!
//! Each key owns one slot. A slot remembers the last fetcher used to read it,
//! so invalidation and explicit retries can refetch without the caller. At
//! most one fetch per key is in flight; it is a shared future that every
//! concurrent reader joins, and that writes its own result back into the
//! slot when it settles. Fetches run on spawned tasks, so dropping a reader
//! never cancels a request.
//!
//! Invalidation supersedes a fetch that is still running: the slot forgets
//! it, so its result is dropped when it lands and the next read (or, for an
//! observed key, the invalidation itself) starts a fresh request. Readers
//! already waiting on the old request still receive its result.

use crate::entry::{CacheEntry, QueryStatus};
use crate::freshness::{Freshness, ReadOptions};
use crate::key::QueryKey;
use crate::observer::QueryObserver;
use crate::stats::{CacheStats, Counters};
use agora_core::{AgoraError, AgoraResult, CacheError, Timestamp};
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<AnyData, AgoraError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;
type Refetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchOutcome> + Send + Sync>;

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Freshness applied to reads that do not specify one.
    pub default_freshness: Freshness,
    /// How long an unobserved entry may sit idle before garbage collection.
    pub gc_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_freshness: Freshness::best_effort(Duration::from_secs(60)),
            gc_time: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.default_freshness = freshness;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct Slot {
    data: Option<AnyData>,
    status: QueryStatus,
    error: Option<AgoraError>,
    last_fetched_at: Option<Timestamp>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<InFlight>,
    refetcher: Option<Refetcher>,
    observers: usize,
    version: watch::Sender<u64>,
    idle_since: Instant,
}

impl Slot {
    fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            last_fetched_at: None,
            fetched_at: None,
            invalidated: false,
            in_flight: None,
            refetcher: None,
            observers: 0,
            version,
            idle_since: Instant::now(),
        }
    }

    fn is_stale(&self, freshness: Freshness) -> bool {
        if self.invalidated {
            return true;
        }
        match (&self.data, self.fetched_at) {
            (Some(_), Some(at)) => freshness.is_expired(at.elapsed()),
            _ => true,
        }
    }

    /// Errored entries wait for an explicit retry or an invalidation.
    fn wants_fetch(&self, freshness: Freshness) -> bool {
        self.in_flight.is_none()
            && (self.invalidated
                || (self.status != QueryStatus::Error && self.is_stale(freshness)))
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Forget the running fetch so its result is ignored when it lands.
    fn supersede(&mut self) -> Option<u64> {
        let superseded = self.in_flight.take()?;
        self.status = if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Idle
        };
        Some(superseded.id)
    }

    fn touch(&mut self) {
        self.idle_since = Instant::now();
    }

    fn snapshot<T: Any + Send + Sync>(
        &self,
        key: &QueryKey,
        freshness: Freshness,
    ) -> AgoraResult<CacheEntry<T>> {
        let data = match &self.data {
            Some(any) => Some(downcast::<T>(key, any.clone())?),
            None => None,
        };
        Ok(CacheEntry {
            key: key.clone(),
            data,
            status: self.status,
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            is_stale: self.is_stale(freshness),
            is_fetching: self.in_flight.is_some(),
        })
    }
}

fn downcast<T: Any + Send + Sync>(key: &QueryKey, data: AnyData) -> AgoraResult<Arc<T>> {
    data.downcast::<T>().map_err(|_| {
        CacheError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
        }
        .into()
    })
}

fn erase<T, F, Fut>(fetcher: F) -> Refetcher
where
    T: Any + Send + Sync,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AgoraResult<T>> + Send + 'static,
{
    Arc::new(move || {
        let request = fetcher();
        async move { request.await.map(|value| Arc::new(value) as AnyData) }.boxed()
    })
}

fn spawn_detached(handle: &Handle, fetch: SharedFetch) {
    handle.spawn(async move {
        let _ = fetch.await;
    });
}

pub(crate) struct CacheInner {
    config: CacheConfig,
    slots: Mutex<HashMap<QueryKey, Slot>>,
    counters: Counters,
    next_fetch_id: AtomicU64,
    janitor: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl CacheInner {
    fn slots(&self) -> AgoraResult<MutexGuard<'_, HashMap<QueryKey, Slot>>> {
        self.slots
            .lock()
            .map_err(|_| AgoraError::Cache(CacheError::LockPoisoned))
    }

    /// Arm a fetch for `slot`. The caller spawns the returned future once the
    /// slot lock is released.
    fn start_fetch(inner: &Arc<Self>, key: &QueryKey, slot: &mut Slot) -> Option<SharedFetch> {
        let refetcher = slot.refetcher.clone()?;
        let id = inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let cache = Arc::downgrade(inner);
        let fetch_key = key.clone();

        let future = async move {
            let outcome = refetcher().await;
            if let Some(inner) = cache.upgrade() {
                inner.complete(&fetch_key, id, &outcome);
            }
            outcome
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            id,
            future: future.clone(),
        });
        slot.status = QueryStatus::Loading;
        slot.notify();
        Counters::bump(&inner.counters.fetches, 1);
        trace!(key = %key, fetch_id = id, "Fetch started");
        Some(future)
    }

    fn complete(&self, key: &QueryKey, fetch_id: u64, outcome: &FetchOutcome) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        let Some(slot) = slots.get_mut(key) else {
            return;
        };
        if slot.in_flight.as_ref().map(|f| f.id) != Some(fetch_id) {
            trace!(key = %key, fetch_id, "Dropping result of superseded fetch");
            return;
        }
        slot.in_flight = None;
        match outcome {
            Ok(data) => {
                slot.data = Some(data.clone());
                slot.status = QueryStatus::Success;
                slot.error = None;
                slot.last_fetched_at = Some(Utc::now());
                slot.fetched_at = Some(Instant::now());
                debug!(key = %key, fetch_id, "Fetch succeeded");
            }
            Err(err) => {
                slot.status = QueryStatus::Error;
                slot.error = Some(err.clone());
                warn!(key = %key, fetch_id, error = %err, "Fetch failed");
            }
        }
        slot.invalidated = false;
        slot.touch();
        slot.notify();
    }

    pub(crate) fn release_observer(&self, key: &QueryKey) {
        if let Ok(mut slots) = self.slots.lock() {
            if let Some(slot) = slots.get_mut(key) {
                slot.observers = slot.observers.saturating_sub(1);
                if slot.observers == 0 {
                    slot.touch();
                }
            }
        }
    }
}

/// Handle to the process-wide query cache. Clones share the same slots.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.inner.config)
            .field("shut_down", &self.inner.shut_down.load(Ordering::Acquire))
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                slots: Mutex::new(HashMap::new()),
                counters: Counters::default(),
                next_fetch_id: AtomicU64::new(1),
                janitor: Mutex::new(None),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn ensure_running(&self) -> AgoraResult<Handle> {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(CacheError::Shutdown.into());
        }
        Handle::try_current().map_err(|_| AgoraError::Cache(CacheError::NoRuntime))
    }

    /// Return the current entry for `key`, starting a background fetch when
    /// the entry is missing or stale and nothing is in flight yet.
    pub fn read<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: ReadOptions,
    ) -> AgoraResult<CacheEntry<T>>
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgoraResult<T>> + Send + 'static,
    {
        self.prepare(key, fetcher, options).map(|(entry, _)| entry)
    }

    /// Like [`read`](Self::read), but waits for the value to settle.
    ///
    /// Joins the in-flight fetch when there is one. An errored entry yields
    /// its stored error until it is retried or invalidated.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: ReadOptions,
    ) -> AgoraResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgoraResult<T>> + Send + 'static,
    {
        let (entry, pending) = self.prepare(key, fetcher, options)?;
        if let Some(pending) = pending {
            let data = pending.await?;
            return downcast(&entry.key, data);
        }
        match entry {
            CacheEntry {
                status: QueryStatus::Error,
                error: Some(err),
                ..
            } => Err(err),
            CacheEntry {
                data: Some(data), ..
            } => Ok(data),
            entry => Err(CacheError::Disabled {
                key: entry.key.to_string(),
            }
            .into()),
        }
    }

    fn prepare<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: ReadOptions,
    ) -> AgoraResult<(CacheEntry<T>, Option<SharedFetch>)>
    where
        T: Any + Send + Sync,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgoraResult<T>> + Send + 'static,
    {
        let handle = self.ensure_running()?;
        let freshness = options
            .freshness
            .unwrap_or(self.inner.config.default_freshness);

        let (snapshot, pending, started) = {
            let mut slots = self.inner.slots()?;

            if !options.enabled {
                let entry = match slots.get(&key) {
                    Some(slot) => slot.snapshot(&key, freshness)?,
                    None => CacheEntry::idle(key),
                };
                return Ok((entry, None));
            }

            let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
            if let Some(data) = &slot.data {
                if !data.is::<T>() {
                    return Err(CacheError::TypeMismatch {
                        key: key.to_string(),
                        expected: type_name::<T>(),
                    }
                    .into());
                }
            }
            slot.refetcher = Some(erase(fetcher));
            slot.touch();

            let started = if slot.wants_fetch(freshness) {
                Counters::bump(&self.inner.counters.misses, 1);
                debug!(key = %key, "Cache miss, fetching");
                CacheInner::start_fetch(&self.inner, &key, slot)
            } else {
                if slot.in_flight.is_some() {
                    Counters::bump(&self.inner.counters.deduplicated, 1);
                    trace!(key = %key, "Joining in-flight fetch");
                } else {
                    Counters::bump(&self.inner.counters.hits, 1);
                }
                None
            };
            let pending = slot.in_flight.as_ref().map(|f| f.future.clone());
            (slot.snapshot(&key, freshness), pending, started)
        };

        if let Some(fetch) = started {
            spawn_detached(&handle, fetch);
        }
        Ok((snapshot?, pending))
    }

    /// Run a mutation, then invalidate `affected_keys` if it succeeded.
    ///
    /// Nothing is patched locally: the cache only learns about the change by
    /// refetching. A failed mutation leaves every entry untouched.
    pub async fn mutate<R, Fut>(&self, mutation: Fut, affected_keys: &[QueryKey]) -> AgoraResult<R>
    where
        Fut: Future<Output = AgoraResult<R>>,
    {
        match mutation.await {
            Ok(result) => {
                let marked = self.invalidate(affected_keys)?;
                debug!(keys = affected_keys.len(), marked, "Mutation succeeded");
                Ok(result)
            }
            Err(err) => {
                debug!(error = %err, "Mutation failed, cache untouched");
                Err(err)
            }
        }
    }

    /// Mark every entry covered by `keys` stale. A fetch still running for a
    /// marked entry is superseded. Observed entries refetch now; the rest
    /// refetch on their next read. Returns the number marked.
    pub fn invalidate(&self, keys: &[QueryKey]) -> AgoraResult<usize> {
        let handle = self.ensure_running()?;

        let (marked, follow_ups) = {
            let mut slots = self.inner.slots()?;
            let mut marked = 0usize;
            let mut follow_ups = Vec::new();
            for (key, slot) in slots.iter_mut() {
                if !keys.iter().any(|target| target.covers(key)) {
                    continue;
                }
                slot.invalidated = true;
                if let Some(fetch_id) = slot.supersede() {
                    debug!(key = %key, fetch_id, "Superseding in-flight fetch");
                }
                slot.notify();
                marked += 1;
                if slot.observers > 0 {
                    if let Some(fetch) = CacheInner::start_fetch(&self.inner, key, slot) {
                        follow_ups.push(fetch);
                    }
                }
            }
            (marked, follow_ups)
        };

        Counters::bump(&self.inner.counters.invalidations, marked as u64);
        debug!(
            targets = keys.len(),
            marked,
            refetching = follow_ups.len(),
            "Invalidated queries"
        );
        for fetch in follow_ups {
            spawn_detached(&handle, fetch);
        }
        Ok(marked)
    }

    /// Retry `key` with the fetcher from its last read, waiting for the result.
    /// Joins the in-flight fetch if one is already running.
    pub async fn refetch(&self, key: &QueryKey) -> AgoraResult<()> {
        let handle = self.ensure_running()?;

        let (pending, started) = {
            let mut slots = self.inner.slots()?;
            let slot = slots.get_mut(key).ok_or_else(|| CacheError::NoFetcher {
                key: key.to_string(),
            })?;
            slot.touch();
            if let Some(in_flight) = slot.in_flight.as_ref().map(|f| f.future.clone()) {
                (in_flight, None)
            } else {
                let fetch = CacheInner::start_fetch(&self.inner, key, slot).ok_or_else(|| {
                    CacheError::NoFetcher {
                        key: key.to_string(),
                    }
                })?;
                (fetch.clone(), Some(fetch))
            }
        };

        if let Some(fetch) = started {
            debug!(key = %key, "Explicit refetch");
            spawn_detached(&handle, fetch);
        }
        pending.await.map(|_| ())
    }

    /// Register a mounted consumer of `key`. Dropping the observer unmounts it.
    pub fn observe(&self, key: QueryKey) -> AgoraResult<QueryObserver> {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(CacheError::Shutdown.into());
        }
        let mut slots = self.inner.slots()?;
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        slot.observers += 1;
        let receiver = slot.version.subscribe();
        Ok(QueryObserver::new(key, Arc::downgrade(&self.inner), receiver))
    }

    /// Current entry for `key` without fetching, using the default freshness.
    pub fn peek<T: Any + Send + Sync>(&self, key: &QueryKey) -> AgoraResult<Option<CacheEntry<T>>> {
        let slots = self.inner.slots()?;
        slots
            .get(key)
            .map(|slot| slot.snapshot(key, self.inner.config.default_freshness))
            .transpose()
    }

    pub fn observer_count(&self, key: &QueryKey) -> AgoraResult<usize> {
        let slots = self.inner.slots()?;
        Ok(slots.get(key).map(|slot| slot.observers).unwrap_or(0))
    }

    /// Evict entries with no observers and no fetch that have been idle for
    /// at least `gc_time`. Returns the number evicted.
    pub fn collect_garbage(&self) -> AgoraResult<usize> {
        let gc_time = self.inner.config.gc_time;
        let mut slots = self.inner.slots()?;
        let before = slots.len();
        slots.retain(|key, slot| {
            let evict = slot.observers == 0
                && slot.in_flight.is_none()
                && slot.idle_since.elapsed() >= gc_time;
            if evict {
                debug!(key = %key, "Evicting idle query");
            }
            !evict
        });
        let evicted = before - slots.len();
        Counters::bump(&self.inner.counters.evictions, evicted as u64);
        Ok(evicted)
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `interval` until
    /// shutdown. Replaces any janitor already running.
    pub fn spawn_gc(&self, interval: Duration) -> AgoraResult<()> {
        let handle = self.ensure_running()?;
        let cache = Arc::downgrade(&self.inner);
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                if let Err(err) = (QueryCache { inner }).collect_garbage() {
                    warn!(error = %err, "Garbage collection stopped");
                    break;
                }
            }
        });

        let mut janitor = self
            .inner
            .janitor
            .lock()
            .map_err(|_| AgoraError::Cache(CacheError::LockPoisoned))?;
        if let Some(previous) = janitor.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    pub fn stats(&self) -> AgoraResult<CacheStats> {
        let entry_count = self.inner.slots()?.len() as u64;
        Ok(self.inner.counters.snapshot(entry_count))
    }

    /// Stop the janitor and drop every entry. Later calls fail with
    /// [`CacheError::Shutdown`]; fetches already running finish unobserved.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::Release);
        if let Ok(mut janitor) = self.inner.janitor.lock() {
            if let Some(task) = janitor.take() {
                task.abort();
            }
        }
        if let Ok(mut slots) = self.inner.slots.lock() {
            let dropped = slots.len();
            slots.clear();
            info!(dropped, "Query cache shut down");
        }
    }
}
