//! Behavioural tests for the query cache: de-duplication, non-optimistic
//! invalidation, error retention, observers, and garbage collection.

use agora_core::{AgoraError, AgoraResult, ApiError, CacheError};
use agora_query::{
    CacheConfig, Freshness, QueryCache, QueryKey, QueryStatus, ReadOptions, Resource,
};
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counted(
    calls: &Arc<AtomicUsize>,
    value: u32,
) -> impl Fn() -> BoxFuture<'static, AgoraResult<u32>> + Send + Sync + 'static {
    let calls = calls.clone();
    move || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(value)
        }
        .boxed()
    }
}

fn flaky(
    calls: &Arc<AtomicUsize>,
    failing: &Arc<AtomicBool>,
) -> impl Fn() -> BoxFuture<'static, AgoraResult<u32>> + Send + Sync + 'static {
    let calls = calls.clone();
    let failing = failing.clone();
    move || {
        let calls = calls.clone();
        let failing = failing.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
            if failing.load(Ordering::SeqCst) {
                Err(AgoraError::Api(ApiError::Server {
                    status: 500,
                    message: Some("boom".to_string()),
                }))
            } else {
                Ok(n)
            }
        }
        .boxed()
    }
}

fn consistent_cache() -> QueryCache {
    QueryCache::new(CacheConfig::new().with_freshness(Freshness::Consistent))
}

fn post(id: &str) -> QueryKey {
    QueryKey::new(Resource::Post).with(id)
}

#[tokio::test(start_paused = true)]
async fn concurrent_reads_of_one_key_share_a_single_fetch() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");

    let first = cache
        .read(key.clone(), counted(&calls, 7), ReadOptions::default())
        .unwrap();
    assert_eq!(first.status, QueryStatus::Loading);
    assert!(first.is_loading());
    assert!(first.is_fetching);

    let (a, b, c) = tokio::join!(
        cache.fetch(key.clone(), counted(&calls, 7), ReadOptions::default()),
        cache.fetch(key.clone(), counted(&calls, 7), ReadOptions::default()),
        cache.fetch(key.clone(), counted(&calls, 7), ReadOptions::default()),
    );
    assert_eq!(*a.unwrap(), 7);
    assert_eq!(*b.unwrap(), 7);
    assert_eq!(*c.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = cache.stats().unwrap();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.deduplicated, 3);
    assert_eq!(stats.fetches, 1);
}

#[tokio::test(start_paused = true)]
async fn successful_mutation_refetches_only_affected_keys() {
    let cache = consistent_cache();
    let (ca, cb, cc) = (
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
        Arc::new(AtomicUsize::new(0)),
    );
    let (a, b, c) = (post("a"), post("b"), post("c"));

    cache.fetch(a.clone(), counted(&ca, 1), ReadOptions::default()).await.unwrap();
    cache.fetch(b.clone(), counted(&cb, 1), ReadOptions::default()).await.unwrap();
    cache.fetch(c.clone(), counted(&cc, 1), ReadOptions::default()).await.unwrap();

    let result = cache
        .mutate(async { Ok::<_, AgoraError>("voted") }, &[a.clone(), b.clone()])
        .await
        .unwrap();
    assert_eq!(result, "voted");

    assert!(cache.peek::<u32>(&a).unwrap().unwrap().is_stale);
    assert!(cache.peek::<u32>(&b).unwrap().unwrap().is_stale);
    assert!(!cache.peek::<u32>(&c).unwrap().unwrap().is_stale);

    cache.fetch(a.clone(), counted(&ca, 1), ReadOptions::default()).await.unwrap();
    cache.fetch(b.clone(), counted(&cb, 1), ReadOptions::default()).await.unwrap();
    cache.fetch(c.clone(), counted(&cc, 1), ReadOptions::default()).await.unwrap();

    assert_eq!(ca.load(Ordering::SeqCst), 2);
    assert_eq!(cb.load(Ordering::SeqCst), 2);
    assert_eq!(cc.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_mutation_leaves_cache_untouched() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let a = post("a");
    cache.fetch(a.clone(), counted(&calls, 3), ReadOptions::default()).await.unwrap();

    let err = cache
        .mutate(
            async {
                Err::<(), _>(AgoraError::Api(ApiError::Server {
                    status: 500,
                    message: None,
                }))
            },
            &[a.clone()],
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));

    let entry = cache.peek::<u32>(&a).unwrap().unwrap();
    assert!(!entry.is_stale);
    assert_eq!(entry.data(), Some(&3));

    cache.fetch(a.clone(), counted(&calls, 3), ReadOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.stats().unwrap().invalidations, 0);
}

#[tokio::test(start_paused = true)]
async fn list_invalidation_covers_every_page_and_sort() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let newest = QueryKey::new(Resource::Posts).with("newest").with(1u32);
    let popular = QueryKey::new(Resource::Posts).with("popular").with(3u32);
    let detail = post("a");

    for key in [&newest, &popular, &detail] {
        cache.fetch(key.clone(), counted(&calls, 1), ReadOptions::default()).await.unwrap();
    }

    let marked = cache.invalidate(&[QueryKey::new(Resource::Posts)]).unwrap();
    assert_eq!(marked, 2);
    assert!(!cache.peek::<u32>(&detail).unwrap().unwrap().is_stale);
}

#[tokio::test(start_paused = true)]
async fn fetch_error_keeps_previous_data_and_waits_for_retry() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let failing = Arc::new(AtomicBool::new(false));
    let key = post("a");

    let first = cache
        .fetch(key.clone(), flaky(&calls, &failing), ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(*first, 1);

    failing.store(true, Ordering::SeqCst);
    cache.invalidate(&[key.clone()]).unwrap();
    let err = cache
        .fetch(key.clone(), flaky(&calls, &failing), ReadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.user_message("fallback"), "boom");

    let entry = cache.peek::<u32>(&key).unwrap().unwrap();
    assert_eq!(entry.status, QueryStatus::Error);
    assert_eq!(entry.data(), Some(&1));
    assert!(entry.error.is_some());

    // No automatic retry on read.
    let again = cache
        .read(key.clone(), flaky(&calls, &failing), ReadOptions::default())
        .unwrap();
    assert!(again.is_error());
    assert!(!again.is_fetching);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    failing.store(false, Ordering::SeqCst);
    cache.refetch(&key).await.unwrap();
    let entry = cache.peek::<u32>(&key).unwrap().unwrap();
    assert_eq!(entry.status, QueryStatus::Success);
    assert_eq!(entry.data(), Some(&3));
    assert!(entry.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn other_keys_unaffected_by_a_failing_fetch() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let failing = Arc::new(AtomicBool::new(true));

    let err = cache
        .fetch(post("bad"), flaky(&calls, &failing), ReadOptions::default())
        .await;
    assert!(err.is_err());
    let good = cache
        .fetch(post("good"), counted(&calls, 9), ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(*good, 9);
}

/// Reads the server's vote count when the request starts and answers 50ms
/// later, like a GET racing a vote.
fn snapshot_of(
    votes: &Arc<AtomicU32>,
    calls: &Arc<AtomicUsize>,
) -> impl Fn() -> BoxFuture<'static, AgoraResult<u32>> + Send + Sync + 'static {
    let votes = votes.clone();
    let calls = calls.clone();
    move || {
        let seen = votes.load(Ordering::SeqCst);
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(seen)
        }
        .boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn fetch_after_mutation_does_not_join_earlier_request() {
    let cache = consistent_cache();
    let votes = Arc::new(AtomicU32::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");

    let pending = cache
        .read(key.clone(), snapshot_of(&votes, &calls), ReadOptions::default())
        .unwrap();
    assert!(pending.is_fetching);

    let server = votes.clone();
    cache
        .mutate(
            async move {
                server.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AgoraError>(())
            },
            &[key.clone()],
        )
        .await
        .unwrap();

    let value = cache
        .fetch(key.clone(), snapshot_of(&votes, &calls), ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(*value, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The earlier request lands after the newer one and must not overwrite it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let entry = cache.peek::<u32>(&key).unwrap().unwrap();
    assert_eq!(entry.data(), Some(&1));
    assert!(!entry.is_stale);
    assert_eq!(entry.status, QueryStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn unobserved_invalidation_defers_the_new_request_to_the_next_read() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");

    cache
        .read(key.clone(), counted(&calls, 5), ReadOptions::default())
        .unwrap();
    assert_eq!(cache.invalidate(&[key.clone()]).unwrap(), 1);

    let entry = cache.peek::<u32>(&key).unwrap().unwrap();
    assert!(!entry.is_fetching);
    assert!(entry.is_stale);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let value = cache
        .fetch(key.clone(), counted(&calls, 6), ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(*value, 6);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn observed_keys_refetch_on_invalidation() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");
    cache.fetch(key.clone(), counted(&calls, 1), ReadOptions::default()).await.unwrap();

    let observer = cache.observe(key.clone()).unwrap();
    assert_eq!(cache.observer_count(&key).unwrap(), 1);
    let before = observer.version();

    cache.invalidate(&[QueryKey::new(Resource::Post)]).unwrap();
    assert!(observer.has_changed());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(observer.version() > before);
    assert!(!cache.peek::<u32>(&key).unwrap().unwrap().is_stale);

    drop(observer);
    assert_eq!(cache.observer_count(&key).unwrap(), 0);
    cache.invalidate(&[key.clone()]).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn observer_wakes_on_change() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");
    let mut observer = cache.observe(key.clone()).unwrap();

    cache
        .read(key.clone(), counted(&calls, 1), ReadOptions::default())
        .unwrap();
    assert!(observer.changed().await);

    cache.shutdown();
    assert!(!observer.changed().await);
}

#[tokio::test(start_paused = true)]
async fn best_effort_reads_refetch_after_window() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");
    let opts = ReadOptions::new().with_freshness(Freshness::best_effort(Duration::from_secs(30)));

    cache.fetch(key.clone(), counted(&calls, 1), opts).await.unwrap();
    let hit = cache.read(key.clone(), counted(&calls, 1), opts).unwrap();
    assert!(!hit.is_stale);
    assert!(!hit.is_fetching);

    tokio::time::advance(Duration::from_secs(31)).await;
    let refreshing = cache.read(key.clone(), counted(&calls, 1), opts).unwrap();
    assert_eq!(refreshing.status, QueryStatus::Loading);
    assert_eq!(refreshing.data(), Some(&1));
    assert!(!refreshing.is_loading());

    cache.fetch(key.clone(), counted(&calls, 1), opts).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn disabled_read_never_fetches() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::new(Resource::Role).with("a@b.c");

    let entry = cache
        .read(key.clone(), counted(&calls, 1), ReadOptions::disabled())
        .unwrap();
    assert_eq!(entry.status, QueryStatus::Idle);

    let err = cache
        .fetch(key.clone(), counted(&calls, 1), ReadOptions::disabled())
        .await
        .unwrap_err();
    assert!(matches!(err, AgoraError::Cache(CacheError::Disabled { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.stats().unwrap().entry_count, 0);
}

#[tokio::test(start_paused = true)]
async fn garbage_collection_spares_observed_entries() {
    let cache = QueryCache::new(
        CacheConfig::new()
            .with_freshness(Freshness::Consistent)
            .with_gc_time(Duration::from_secs(300)),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let (a, b) = (post("a"), post("b"));
    cache.fetch(a.clone(), counted(&calls, 1), ReadOptions::default()).await.unwrap();
    cache.fetch(b.clone(), counted(&calls, 1), ReadOptions::default()).await.unwrap();
    let _mounted = cache.observe(b.clone()).unwrap();

    assert_eq!(cache.collect_garbage().unwrap(), 0);
    tokio::time::advance(Duration::from_secs(301)).await;
    assert_eq!(cache.collect_garbage().unwrap(), 1);

    assert!(cache.peek::<u32>(&a).unwrap().is_none());
    assert!(cache.peek::<u32>(&b).unwrap().is_some());
    assert_eq!(cache.stats().unwrap().evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn janitor_evicts_in_background() {
    let cache = QueryCache::new(
        CacheConfig::new()
            .with_freshness(Freshness::Consistent)
            .with_gc_time(Duration::from_secs(1)),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    cache.fetch(post("a"), counted(&calls, 1), ReadOptions::default()).await.unwrap();
    cache.spawn_gc(Duration::from_secs(60)).unwrap();

    tokio::time::sleep(Duration::from_secs(130)).await;
    let stats = cache.stats().unwrap();
    assert_eq!(stats.entry_count, 0);
    assert_eq!(stats.evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn type_mismatch_is_reported() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = post("a");
    cache.fetch(key.clone(), counted(&calls, 1), ReadOptions::default()).await.unwrap();

    let err = cache
        .fetch(
            key.clone(),
            || async { Ok::<_, AgoraError>("text".to_string()) },
            ReadOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgoraError::Cache(CacheError::TypeMismatch { .. })));
}

#[tokio::test]
async fn refetch_requires_a_prior_read() {
    let cache = consistent_cache();
    let err = cache.refetch(&post("never-read")).await.unwrap_err();
    assert!(matches!(err, AgoraError::Cache(CacheError::NoFetcher { .. })));
}

#[tokio::test]
async fn shutdown_rejects_further_reads() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    cache.shutdown();
    let err = cache
        .read(post("a"), counted(&calls, 1), ReadOptions::default())
        .unwrap_err();
    assert_eq!(err, AgoraError::Cache(CacheError::Shutdown));
}

#[test]
fn reads_outside_a_runtime_fail_cleanly() {
    let cache = consistent_cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let err = cache
        .read(post("a"), counted(&calls, 1), ReadOptions::default())
        .unwrap_err();
    assert_eq!(err, AgoraError::Cache(CacheError::NoRuntime));
}
