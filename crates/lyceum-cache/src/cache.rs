//! Query cache with request de-duplication and prefix invalidation.

use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::key::QueryKey;
use crate::stale::StaleTracker;

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue>>>;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// No fresh result; the next read fetches.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Holds a result that is served without fetching.
    Success,
    /// The last fetch failed; the next read fetches again.
    Error,
}

/// Decides whether reads may reach the network.
///
/// Closures work directly: `cache.with_gate(move || client.is_ready())`.
pub trait ReadGate: Send + Sync {
    fn is_open(&self) -> bool;
}

impl<F> ReadGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_open(&self) -> bool {
        self()
    }
}

/// One cached query.
struct Slot {
    status: EntryStatus,
    value: Option<AnyValue>,
    last_error: Option<String>,
    /// Identifies the fetch that owns this slot's `Loading` state.
    generation: u64,
    pending: Option<SharedFetch>,
    /// Invalidated while loading: settle into `Idle` instead of `Success`.
    invalidated_in_flight: bool,
}

impl Slot {
    fn loading(generation: u64, pending: SharedFetch, previous: Option<Slot>) -> Self {
        let (value, last_error) = previous
            .map(|s| (s.value, s.last_error))
            .unwrap_or((None, None));
        Self {
            status: EntryStatus::Loading,
            value,
            last_error,
            generation,
            pending: Some(pending),
            invalidated_in_flight: false,
        }
    }

    /// Apply an invalidation. Returns whether anything changed.
    fn invalidate(&mut self) -> bool {
        match self.status {
            EntryStatus::Success | EntryStatus::Error => {
                self.status = EntryStatus::Idle;
                true
            }
            EntryStatus::Loading => {
                self.invalidated_in_flight = true;
                true
            }
            EntryStatus::Idle => false,
        }
    }
}

/// Inner state protected by a mutex. Never held across an await.
struct CacheInner {
    /// LRU map of entries.
    lru: LruCache<QueryKey, Slot>,

    /// Fetch-age tracker for stale-after expiry.
    stale: StaleTracker,

    /// Configured bound. The LRU may briefly hold more while every entry
    /// is `Loading`.
    capacity: NonZeroUsize,

    next_generation: u64,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Insert a slot for a key not currently present, evicting least
    /// recently used entries that are not `Loading`. An in-flight entry is
    /// never evicted: its key must keep pointing at the shared fetch.
    fn insert(&mut self, key: QueryKey, slot: Slot) {
        while self.lru.len() >= self.capacity.get() {
            let victim = self
                .lru
                .iter()
                .rev()
                .find(|(_, s)| s.status != EntryStatus::Loading)
                .map(|(k, _)| k.clone());
            let Some(victim) = victim else {
                break;
            };
            debug!(key = %victim, "evicting least recently used query");
            self.lru.pop(&victim);
            self.stale.remove(&victim);
        }

        let wanted = self.capacity.max(NonZeroUsize::MIN.saturating_add(self.lru.len()));
        if self.lru.cap() != wanted {
            trace!(from = self.lru.cap().get(), to = wanted.get(), "resizing query cache");
            self.lru.resize(wanted);
        }
        self.lru.put(key, slot);
    }
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub status: EntryStatus,
    pub has_value: bool,
    pub last_error: Option<String>,
    pub generation: u64,
    pub fetched_at: Option<Instant>,
}

/// Keyed cache of remote-read results.
///
/// This cache provides:
/// - At most one in-flight fetch per key; concurrent readers share it
/// - Cached results until invalidated by exact key or prefix
/// - Inert reads while the [`ReadGate`] is closed
/// - LRU eviction at capacity (skipping entries still loading) and
///   optional stale-after expiry
///
/// Fetches run on their own task, so a reader that goes away (or is
/// cancelled through [`QueryCache::read_with_cancel`]) never strands an
/// entry in `Loading`. Values of any `Clone + Send + Sync` type can be
/// stored; a key always holds values of one type.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
    gate: Option<Arc<dyn ReadGate>>,
    config: CacheConfig,
}

impl QueryCache {
    /// Create a new cache with an always-open gate.
    pub fn new(config: CacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);

        let inner = CacheInner {
            lru: LruCache::new(cap),
            stale: StaleTracker::new(config.stale_after),
            capacity: cap,
            next_generation: 0,
            hits: 0,
            misses: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            gate: None,
            config,
        }
    }

    /// Gate reads on `gate`; while it is closed reads return `Ok(None)`
    /// without fetching.
    pub fn with_gate(mut self, gate: impl ReadGate + 'static) -> Self {
        self.gate = Some(Arc::new(gate));
        self
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether reads may currently fetch.
    pub fn is_open(&self) -> bool {
        self.gate.as_ref().is_none_or(|g| g.is_open())
    }

    /// Get the current number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Read `key`, fetching with `fetcher` only when needed.
    ///
    /// - `Success` (and not stale): the cached value, no fetch
    /// - `Loading`: waits for the in-flight fetch
    /// - otherwise: starts a fetch
    ///
    /// Returns `Ok(None)` when the gate is closed.
    pub async fn read<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        if !self.is_open() {
            trace!(key = %key, "read gate closed, skipping fetch");
            return Ok(None);
        }

        let pending = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let stale = inner.stale.is_stale(key);

            let joined = match inner.lru.get(key) {
                Some(slot) if slot.status == EntryStatus::Success && !stale => {
                    if let Some(value) = slot.value.clone() {
                        inner.hits += 1;
                        trace!(key = %key, "cache hit");
                        return downcast(key, &value).map(Some);
                    }
                    None
                }
                Some(slot) if slot.status == EntryStatus::Loading => slot.pending.clone(),
                _ => None,
            };

            match joined {
                Some(pending) => {
                    trace!(key = %key, "joining in-flight fetch");
                    pending
                }
                None => {
                    inner.misses += 1;
                    self.start_fetch(inner, key, fetcher())
                }
            }
        };

        let value = pending.await?;
        downcast(key, &value).map(Some)
    }

    /// Like [`QueryCache::read`], but gives up with
    /// [`CacheError::Cancelled`] once `cancel` fires. The fetch itself keeps
    /// running and still populates the cache for other readers.
    pub async fn read_with_cancel<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        fetcher: F,
        cancel: &CancellationToken,
    ) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(CacheError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(key = %key, "read cancelled by caller");
                Err(CacheError::Cancelled)
            }
            result = self.read(key, fetcher) => result,
        }
    }

    /// Spawn the fetch and park a `Loading` slot for it. Called with the
    /// lock held; the spawned task cannot settle before the slot exists.
    fn start_fetch<T, E, Fut>(
        &self,
        inner: &mut CacheInner,
        key: &QueryKey,
        fetch: Fut,
    ) -> SharedFetch
    where
        T: Clone + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let generation = inner.next_generation();
        debug!(key = %key, generation, "cache miss, fetching");

        let state = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let outcome: Result<AnyValue> = match fetch.await {
                Ok(value) => Ok(Arc::new(value) as AnyValue),
                Err(e) => Err(CacheError::Fetch(Arc::new(e))),
            };
            settle(&state, &task_key, generation, &outcome);
            outcome
        });

        let abort_key = key.to_string();
        let pending: SharedFetch = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(_) => Err(CacheError::Aborted(abort_key)),
            }
        }
        .boxed()
        .shared();

        let previous = inner.lru.pop(key);
        let slot = Slot::loading(generation, pending.clone(), previous);
        inner.insert(key.clone(), slot);

        pending
    }

    /// Move the entry for exactly `key` to `Idle`.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut inner = self.inner.lock();
        let changed = inner
            .lru
            .peek_mut(key)
            .map(Slot::invalidate)
            .unwrap_or(false);
        if changed {
            debug!(key = %key, "query invalidated");
        }
        changed
    }

    /// Move every entry under `prefix` to `Idle`. Returns how many changed.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        self.invalidate_many(std::slice::from_ref(prefix))
    }

    /// Invalidate every entry under any of `prefixes` in one step: no reader
    /// observes a partially applied set.
    pub fn invalidate_many(&self, prefixes: &[QueryKey]) -> usize {
        if prefixes.is_empty() {
            return 0;
        }

        let mut inner = self.inner.lock();
        let mut count = 0;
        for (key, slot) in inner.lru.iter_mut() {
            if prefixes.iter().any(|p| key.starts_with(p)) && slot.invalidate() {
                debug!(key = %key, "query invalidated");
                count += 1;
            }
        }
        count
    }

    /// Drop every entry. In-flight fetches still resolve for their readers
    /// but no longer write back.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.lru.len();
        inner.lru.clear();
        inner.stale.clear();
        if count > 0 {
            debug!(count, "query cache cleared");
        }
        count
    }

    /// Inspect an entry without touching LRU order.
    pub fn snapshot(&self, key: &QueryKey) -> Option<EntrySnapshot> {
        let inner = self.inner.lock();
        inner.lru.peek(key).map(|slot| EntrySnapshot {
            status: slot.status,
            has_value: slot.value.is_some(),
            last_error: slot.last_error.clone(),
            generation: slot.generation,
            fetched_at: inner.stale.fetched_at(key),
        })
    }

    /// Status of an entry, if present.
    pub fn status(&self, key: &QueryKey) -> Option<EntryStatus> {
        self.inner.lock().lru.peek(key).map(|slot| slot.status)
    }

    /// Last stored value for a key, whatever its status, without touching
    /// LRU order.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let inner = self.inner.lock();
        inner
            .lru
            .peek(key)
            .and_then(|slot| slot.value.as_ref())
            .and_then(|value| value.downcast_ref::<T>().cloned())
    }

    /// Keys currently cached, most recently used first.
    pub fn keys(&self) -> Vec<QueryKey> {
        self.inner.lock().lru.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.lru.len(),
            capacity: self.config.max_entries,
            loading: inner
                .lru
                .iter()
                .filter(|(_, s)| s.status == EntryStatus::Loading)
                .count(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

/// Record a finished fetch, unless the slot was cleared or re-fetched since.
fn settle(state: &Mutex<CacheInner>, key: &QueryKey, generation: u64, outcome: &Result<AnyValue>) {
    let mut inner = state.lock();

    let Some(slot) = inner.lru.peek_mut(key) else {
        trace!(key = %key, "fetch finished after entry was dropped");
        return;
    };
    if slot.generation != generation {
        trace!(key = %key, "fetch superseded");
        return;
    }

    slot.pending = None;
    let invalidated = std::mem::take(&mut slot.invalidated_in_flight);

    let succeeded = match outcome {
        Ok(value) => {
            slot.value = Some(Arc::clone(value));
            slot.last_error = None;
            slot.status = if invalidated {
                EntryStatus::Idle
            } else {
                EntryStatus::Success
            };
            true
        }
        Err(e) => {
            slot.last_error = Some(e.to_string());
            slot.status = if invalidated {
                EntryStatus::Idle
            } else {
                EntryStatus::Error
            };
            false
        }
    };

    if succeeded {
        inner.stale.record(key);
    }
    trace!(key = %key, succeeded, invalidated, "fetch settled");
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &AnyValue) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| CacheError::TypeMismatch(key.to_string()))
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Entries with a fetch in flight.
    pub loading: usize,

    /// Reads served from cache.
    pub hits: u64,

    /// Reads that started a fetch.
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    fn key(parts: &[&str]) -> QueryKey {
        QueryKey::new(parts.iter().copied())
    }

    /// Fetcher factory counting invocations.
    fn counting(
        calls: &Arc<AtomicUsize>,
        value: Vec<String>,
    ) -> impl FnOnce() -> BoxFuture<'static, std::result::Result<Vec<String>, TestError>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_read_caches_success() {
        let cache = QueryCache::new(CacheConfig::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(&["courses"]);

        let first = cache.read(&k, counting(&calls, vec!["a".into()])).await.unwrap();
        let second = cache.read(&k, counting(&calls, vec!["b".into()])).await.unwrap();

        assert_eq!(first, Some(vec!["a".to_string()]));
        assert_eq!(second, Some(vec!["a".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&k), Some(EntryStatus::Success));
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new(CacheConfig::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());
        let k = key(&["myEnrolledCourses"]);

        let fetcher = |calls: Arc<AtomicUsize>, release: Arc<Notify>| {
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    release.notified().await;
                    Ok::<_, TestError>(vec!["course-42".to_string()])
                }
            }
        };

        let reads = (0..5).map(|_| {
            let cache = cache.clone();
            let k = k.clone();
            let f = fetcher(calls.clone(), release.clone());
            tokio::spawn(async move { cache.read(&k, f).await })
        });
        let handles: Vec<_> = reads.collect();

        // Let every reader register before the fetch resolves.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.status(&k), Some(EntryStatus::Loading));
        release.notify_one();

        for h in handles {
            let value = h.await.unwrap().unwrap();
            assert_eq!(value, Some(vec!["course-42".to_string()]));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prefix_invalidation_scope() {
        let cache = QueryCache::new(CacheConfig::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let reviews = key(&["courseReviews", "42"]);
        let other_reviews = key(&["courseReviews", "7"]);
        let catalog = key(&["courses"]);

        for k in [&reviews, &other_reviews, &catalog] {
            cache.read(k, counting(&calls, vec![])).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let changed = cache.invalidate_prefix(&key(&["courseReviews"]));
        assert_eq!(changed, 2);
        assert_eq!(cache.status(&reviews), Some(EntryStatus::Idle));
        assert_eq!(cache.status(&catalog), Some(EntryStatus::Success));

        cache.read(&reviews, counting(&calls, vec![])).await.unwrap();
        cache.read(&catalog, counting(&calls, vec![])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exact_invalidation() {
        let cache = QueryCache::new(CacheConfig::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let course = key(&["course", "42"]);
        let course_long = key(&["course", "42", "videos"]);

        cache.read(&course, counting(&calls, vec![])).await.unwrap();
        cache.read(&course_long, counting(&calls, vec![])).await.unwrap();

        assert!(cache.invalidate(&course));
        assert!(!cache.invalidate(&course));
        assert_eq!(cache.status(&course), Some(EntryStatus::Idle));
        assert_eq!(cache.status(&course_long), Some(EntryStatus::Success));
    }

    #[tokio::test]
    async fn test_failed_fetch_records_error_and_retries() {
        let cache = QueryCache::new(CacheConfig::new());
        let k = key(&["course", "missing"]);

        let err = cache
            .read(&k, || async {
                Err::<Vec<String>, _>(TestError("Course not found".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.fetch_error::<TestError>().unwrap().0, "Course not found");

        let snap = cache.snapshot(&k).unwrap();
        assert_eq!(snap.status, EntryStatus::Error);
        assert_eq!(snap.last_error.as_deref(), Some("Course not found"));

        let calls = Arc::new(AtomicUsize::new(0));
        let value = cache.read(&k, counting(&calls, vec!["x".into()])).await.unwrap();
        assert_eq!(value, Some(vec!["x".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot(&k).unwrap().last_error, None);
    }

    #[tokio::test]
    async fn test_closed_gate_is_inert() {
        let open = Arc::new(AtomicBool::new(false));
        let gate = {
            let open = open.clone();
            move || open.load(Ordering::SeqCst)
        };
        let cache = QueryCache::new(CacheConfig::new()).with_gate(gate);
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(&["courses"]);

        let value = cache.read(&k, counting(&calls, vec![])).await.unwrap();
        assert_eq!(value, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.snapshot(&k).is_none());

        open.store(true, Ordering::SeqCst);
        let value = cache.read(&k, counting(&calls, vec![])).await.unwrap();
        assert_eq!(value, Some(vec![]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_while_loading_lands_idle() {
        let cache = QueryCache::new(CacheConfig::new());
        let release = Arc::new(Notify::new());
        let k = key(&["myEnrolledCourses"]);

        let reader = {
            let cache = cache.clone();
            let k = k.clone();
            let release = release.clone();
            tokio::spawn(async move {
                cache
                    .read(&k, move || async move {
                        release.notified().await;
                        Ok::<_, TestError>(1u32)
                    })
                    .await
            })
        };
        while cache.status(&k) != Some(EntryStatus::Loading) {
            tokio::task::yield_now().await;
        }

        cache.invalidate(&k);
        release.notify_one();

        assert_eq!(reader.await.unwrap().unwrap(), Some(1));
        let snap = cache.snapshot(&k).unwrap();
        assert_eq!(snap.status, EntryStatus::Idle);
        assert!(snap.has_value);

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let value = cache
            .read(&k, move || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, TestError>(2u32) }
            })
            .await
            .unwrap();
        assert_eq!(value, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_reader_does_not_stop_fetch() {
        let cache = QueryCache::new(CacheConfig::new());
        let release = Arc::new(Notify::new());
        let token = CancellationToken::new();
        let k = key(&["courseVideos", "42"]);

        let reader = {
            let cache = cache.clone();
            let k = k.clone();
            let release = release.clone();
            let token = token.clone();
            tokio::spawn(async move {
                cache
                    .read_with_cancel(
                        &k,
                        move || async move {
                            release.notified().await;
                            Ok::<_, TestError>("videos".to_string())
                        },
                        &token,
                    )
                    .await
            })
        };
        while cache.status(&k) != Some(EntryStatus::Loading) {
            tokio::task::yield_now().await;
        }

        token.cancel();
        assert!(matches!(
            reader.await.unwrap(),
            Err(CacheError::Cancelled)
        ));

        release.notify_one();
        while cache.status(&k) == Some(EntryStatus::Loading) {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.status(&k), Some(EntryStatus::Success));
        assert_eq!(cache.peek::<String>(&k).as_deref(), Some("videos"));
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = QueryCache::new(CacheConfig::new());
        let calls = Arc::new(AtomicUsize::new(0));
        cache.read(&key(&["a"]), counting(&calls, vec![])).await.unwrap();
        cache.read(&key(&["b"]), counting(&calls, vec![])).await.unwrap();

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());

        cache.read(&key(&["a"]), counting(&calls, vec![])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = QueryCache::new(CacheConfig::new().with_max_entries(2));
        let calls = Arc::new(AtomicUsize::new(0));

        cache.read(&key(&["a"]), counting(&calls, vec![])).await.unwrap();
        cache.read(&key(&["b"]), counting(&calls, vec![])).await.unwrap();
        // Touch "a" so "b" becomes least recently used.
        cache.read(&key(&["a"]), counting(&calls, vec![])).await.unwrap();
        cache.read(&key(&["c"]), counting(&calls, vec![])).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.snapshot(&key(&["a"])).is_some());
        assert!(cache.snapshot(&key(&["b"])).is_none());
        assert!(cache.snapshot(&key(&["c"])).is_some());
    }

    #[tokio::test]
    async fn test_eviction_skips_in_flight_entries() {
        let cache = QueryCache::new(CacheConfig::new().with_max_entries(1));
        let a_calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());
        let a = key(&["course", "a"]);

        let fetch_a = |calls: Arc<AtomicUsize>, release: Arc<Notify>| {
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    release.notified().await;
                    Ok::<_, TestError>("a".to_string())
                }
            }
        };

        let first = {
            let cache = cache.clone();
            let a = a.clone();
            let f = fetch_a(a_calls.clone(), release.clone());
            tokio::spawn(async move { cache.read(&a, f).await })
        };
        while cache.status(&a) != Some(EntryStatus::Loading) {
            tokio::task::yield_now().await;
        }

        // A second key at capacity must not push out the pending fetch.
        let b_calls = Arc::new(AtomicUsize::new(0));
        let b = cache
            .read(&key(&["course", "b"]), counting(&b_calls, vec!["b".into()]))
            .await
            .unwrap();
        assert_eq!(b, Some(vec!["b".to_string()]));
        assert_eq!(cache.status(&a), Some(EntryStatus::Loading));

        let second = {
            let cache = cache.clone();
            let a = a.clone();
            let f = fetch_a(a_calls.clone(), release.clone());
            tokio::spawn(async move { cache.read(&a, f).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        release.notify_one();

        assert_eq!(first.await.unwrap().unwrap().as_deref(), Some("a"));
        assert_eq!(second.await.unwrap().unwrap().as_deref(), Some("a"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status(&a), Some(EntryStatus::Success));

        // Back under pressure, the bound applies again.
        cache
            .read(&key(&["course", "c"]), counting(&b_calls, vec![]))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_after_refetches() {
        let cache = QueryCache::new(
            CacheConfig::new().with_stale_after(Duration::from_millis(30)),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(&["upcomingLiveClasses"]);

        cache.read(&k, counting(&calls, vec![])).await.unwrap();
        cache.read(&k, counting(&calls, vec![])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.read(&k, counting(&calls, vec![])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let cache = QueryCache::new(CacheConfig::new());
        let k = key(&["isAdmin"]);
        cache
            .read(&k, || async { Ok::<_, TestError>(true) })
            .await
            .unwrap();

        let err = cache
            .read(&k, || async { Ok::<_, TestError>("nope".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch(_)));
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = QueryCache::new(CacheConfig::new().with_max_entries(100));
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key(&["courses"]);

        cache.read(&k, counting(&calls, vec![])).await.unwrap();
        cache.read(&k, counting(&calls, vec![])).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 100);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loading, 0);
    }
}
