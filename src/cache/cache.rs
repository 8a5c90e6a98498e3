//! # Request cache with in-flight de-duplication.
//!
//! [`RequestCache`] serves two jobs at once:
//! - a keyed, TTL-bounded result cache with FIFO eviction;
//! - a coalescer that guarantees concurrent callers of the same key exactly
//!   one underlying fetch, all resolved with its single outcome.
//!
//! ## Fetch flow
//! ```text
//! fetch(key, fetcher)
//!   ├─► live entry?        ──► return it (fetcher never runs)
//!   ├─► in-flight slot?    ──► join it, await the leader's outcome
//!   └─► else: become leader
//!          ├─► run fetcher (no lock held across the await)
//!          ├─► Ok(v)  ──► cache v under the dispatch-time key, release slot
//!          ├─► Err(e) ──► release slot, cache nothing
//!          └─► broadcast the outcome to every joiner
//! ```
//!
//! ## Rules
//! - **Failures are never cached**, but every caller that joined the
//!   in-flight fetch observes the same failure.
//! - **Eviction is FIFO by insertion order, not LRU** — reads do not protect
//!   an entry, and overwriting a key keeps its original position. This
//!   mirrors the behavior callers already depend on; see
//!   `test_fifo_eviction_is_not_lru`.
//! - **Invalidation never cancels an in-flight fetch**; its result settles
//!   against the key captured at dispatch time.
//! - A leader whose future is dropped mid-fetch releases the slot (joiners
//!   observe [`CallError::Canceled`], never a hang).
//! - The internal mutex is held only for map bookkeeping, never across an
//!   await.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use regex::Regex;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::entry::CacheEntry;
use crate::error::CallError;

/// Configuration for a [`RequestCache`].
///
/// ## Field semantics
/// - `max_size`: entry cap; inserting past it evicts the oldest-inserted
///   entry (`0` = unbounded).
/// - `default_ttl`: applied by `set`/`fetch` when no per-call TTL is given.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (`0` = unbounded).
    pub max_size: usize,
    /// TTL used when the caller does not supply one.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    /// Defaults: 100 entries, 5 minute TTL.
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl: Duration::from_secs(300),
        }
    }
}

/// Point-in-time view of the cache, for observability and tests.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Live entries currently stored.
    pub size: usize,
    /// Configured entry cap (`0` = unbounded).
    pub max_size: usize,
    /// Per-entry details, oldest-inserted first.
    pub entries: Vec<EntryStats>,
}

/// Stats for one cache entry.
#[derive(Debug, Clone)]
pub struct EntryStats {
    /// The entry's key.
    pub key: String,
    /// Time since insertion.
    pub age: Duration,
    /// Time until expiry.
    pub remaining: Duration,
}

type Outcome<V> = Result<V, CallError>;

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order for FIFO eviction; keys here always exist in `entries`.
    order: VecDeque<String>,
    /// At most one slot per key, alive between dispatch and settlement.
    in_flight: HashMap<String, broadcast::Sender<Outcome<V>>>,
}

impl<V: Clone> CacheInner<V> {
    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn insert(&mut self, key: &str, value: V, ttl: Duration, max_size: usize) {
        let now = Instant::now();
        if let Some(entry) = self.entries.get_mut(key) {
            // Overwrite keeps the key's original insertion-order position.
            *entry = CacheEntry::new(value, now, ttl);
            return;
        }
        if max_size > 0 && self.entries.len() >= max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!(key = %oldest, "evicted oldest-inserted cache entry");
            }
        }
        self.entries.insert(key.to_owned(), CacheEntry::new(value, now, ttl));
        self.order.push_back(key.to_owned());
    }
}

/// Keyed TTL cache with request coalescing.
///
/// Generic over the value type; values are cloned out on every hit, so keep
/// them cheap to clone (`Arc` large payloads).
///
/// # Example
/// ```rust
/// use jobwatch::{CacheConfig, CallError, RequestCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: RequestCache<String> = RequestCache::new(CacheConfig::default());
/// let url = cache
///     .fetch("signed-url:clip-7", || async {
///         Ok::<_, CallError>("https://cdn.example/clip-7?sig=...".to_string())
///     })
///     .await
///     .unwrap();
/// assert_eq!(cache.get("signed-url:clip-7").as_deref(), Some(url.as_str()));
/// # }
/// ```
pub struct RequestCache<V> {
    cfg: CacheConfig,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone + Send + 'static> RequestCache<V> {
    /// Creates an empty cache.
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            cfg,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Returns the cached value if present and unexpired.
    ///
    /// Reading never mutates recency — the only write a read can cause is
    /// discarding the entry it found expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => return Some(entry.value().clone()),
            None => return None,
        };
        if expired {
            inner.remove_entry(key);
        }
        None
    }

    /// Inserts or overwrites an entry.
    ///
    /// With the cache at `max_size` and `key` new, the oldest-inserted entry
    /// is evicted first (FIFO). `ttl = None` uses the configured default.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.cfg.default_ttl);
        let mut inner = self.inner.lock().unwrap();
        inner.insert(key, value, ttl, self.cfg.max_size);
    }

    /// Returns the value for `key`, fetching it at most once across all
    /// concurrent callers.
    ///
    /// 1. A live cache entry is returned immediately (no fetcher call).
    /// 2. If a fetch for `key` is already in flight, this call joins it and
    ///    observes the same outcome — success or failure.
    /// 3. Otherwise the fetcher runs; on success the value is cached under
    ///    the key as captured now (even if invalidated meanwhile), on failure
    ///    nothing is cached. Either way the slot is released and the outcome
    ///    broadcast to every joiner.
    pub async fn fetch<F, Fut>(&self, key: &str, fetcher: F) -> Result<V, CallError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CallError>>,
    {
        enum Role<V> {
            Hit(V),
            Join(broadcast::Receiver<Outcome<V>>),
            Lead(broadcast::Sender<Outcome<V>>),
        }

        let role = {
            let mut inner = self.inner.lock().unwrap();
            let now = Instant::now();
            match inner.entries.get(key) {
                Some(entry) if !entry.is_expired(now) => Role::Hit(entry.value().clone()),
                _ => match inner.in_flight.get(key) {
                    Some(tx) => Role::Join(tx.subscribe()),
                    None => {
                        let (tx, _rx) = broadcast::channel(1);
                        inner.in_flight.insert(key.to_owned(), tx.clone());
                        Role::Lead(tx)
                    }
                },
            }
        };

        match role {
            Role::Hit(value) => Ok(value),
            Role::Join(mut rx) => match rx.recv().await {
                Ok(outcome) => outcome,
                // All senders gone without a send: the leader was dropped
                // mid-fetch and its guard released the slot.
                Err(_) => Err(CallError::Canceled),
            },
            Role::Lead(tx) => {
                let guard = SlotGuard { cache: self, key };
                let outcome = fetcher().await;
                guard.settle(&outcome, self.cfg.default_ttl);
                let _ = tx.send(outcome.clone());
                outcome
            }
        }
    }

    /// Removes the entry for `key`, if any. Returns whether one was removed.
    ///
    /// Does not cancel an in-flight fetch for the key; its result will still
    /// settle (and, if successful, re-populate the key).
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().unwrap().remove_entry(key)
    }

    /// Removes every entry whose key matches `pattern`. Returns the count.
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let doomed: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| pattern.is_match(k))
            .cloned()
            .collect();
        for key in &doomed {
            inner.remove_entry(key);
        }
        doomed.len()
    }

    /// Removes all entries. In-flight fetches are unaffected.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Point-in-time stats, entries oldest-inserted first.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let now = Instant::now();
        let entries = inner
            .order
            .iter()
            .filter_map(|key| {
                inner.entries.get(key).map(|entry| EntryStats {
                    key: key.clone(),
                    age: entry.age(now),
                    remaining: entry.remaining(now),
                })
            })
            .collect();
        CacheStats {
            size: inner.entries.len(),
            max_size: self.cfg.max_size,
            entries,
        }
    }
}

/// Releases an in-flight slot exactly once: either at settlement or, if the
/// leader's future is dropped mid-fetch, from `Drop`.
struct SlotGuard<'a, V> {
    cache: &'a RequestCache<V>,
    key: &'a str,
}

impl<V: Clone + Send + 'static> SlotGuard<'_, V> {
    fn settle(self, outcome: &Result<V, CallError>, ttl: Duration) {
        {
            let mut inner = self.cache.inner.lock().unwrap();
            inner.in_flight.remove(self.key);
            if let Ok(value) = outcome {
                // Cached against the key captured at dispatch time, even if
                // the key was invalidated while the fetch ran.
                let max_size = self.cache.cfg.max_size;
                inner.insert(self.key, value.clone(), ttl, max_size);
            }
        }
        std::mem::forget(self);
    }
}

impl<V> Drop for SlotGuard<'_, V> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.cache.inner.lock() {
            inner.in_flight.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn cache_of(max_size: usize) -> RequestCache<u32> {
        RequestCache::new(CacheConfig {
            max_size,
            default_ttl: Duration::from_secs(60),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_run_the_fetcher_once() {
        let cache: Arc<RequestCache<u32>> = Arc::new(cache_of(10));
        let calls = Arc::new(AtomicU32::new(0));

        let fetch = |c: Arc<RequestCache<u32>>, n: Arc<AtomicU32>| async move {
            c.fetch("k", || async move {
                n.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(42)
            })
            .await
        };

        let (a, b, c) = tokio::join!(
            fetch(Arc::clone(&cache), Arc::clone(&calls)),
            fetch(Arc::clone(&cache), Arc::clone(&calls)),
            fetch(Arc::clone(&cache), Arc::clone(&calls)),
        );

        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
        assert_eq!(c.unwrap(), 42);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_shared_but_never_cached() {
        let cache: Arc<RequestCache<u32>> = Arc::new(cache_of(10));
        let calls = Arc::new(AtomicU32::new(0));

        let fetch = |c: Arc<RequestCache<u32>>, n: Arc<AtomicU32>| async move {
            c.fetch("k", || async move {
                n.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err::<u32, _>(CallError::http(500, "boom"))
            })
            .await
        };

        let (a, b) = tokio::join!(
            fetch(Arc::clone(&cache), Arc::clone(&calls)),
            fetch(Arc::clone(&cache), Arc::clone(&calls)),
        );

        // Both callers observe the one failure...
        assert_eq!(a.unwrap_err(), CallError::http(500, "boom"));
        assert_eq!(b.unwrap_err(), CallError::http(500, "boom"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        // ...and nothing was cached.
        assert_eq!(cache.get("k"), None);
        // A later fetch runs the fetcher again.
        let v = cache.fetch("k", || async { Ok(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_entry_skips_the_fetcher() {
        let cache = cache_of(10);
        let calls = AtomicU32::new(0);
        cache.set("k", 1, None);
        let v = cache
            .fetch("k", || async {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(99)
            })
            .await
            .unwrap();
        assert_eq!(v, 1);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_eviction_is_not_lru() {
        // Deliberately FIFO: reading "a" does not protect it from eviction.
        let cache = cache_of(3);
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.set("c", 3, None);

        // Touch "a" — under LRU this would make "b" the eviction victim.
        assert_eq!(cache.get("a"), Some(1));

        cache.set("d", 4, None);
        assert_eq!(cache.get("a"), None, "oldest-inserted is evicted");
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.get("d"), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_keeps_insertion_position() {
        let cache = cache_of(3);
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.set("c", 3, None);
        // Overwriting "a" does not move it to the back of the FIFO queue.
        cache.set("a", 9, None);
        cache.set("d", 4, None);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("d"), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_is_lazy() {
        let cache = cache_of(10);
        cache.set("k", 1, Some(Duration::from_millis(100)));
        assert_eq!(cache.get("k"), Some(1));

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_pattern_and_clear() {
        let cache = cache_of(10);
        cache.set("url:a", 1, None);
        cache.set("url:b", 2, None);
        cache.set("meta:a", 3, None);

        assert!(cache.invalidate("url:a"));
        assert!(!cache.invalidate("url:a"));

        let removed = cache.invalidate_pattern(&Regex::new("^url:").unwrap());
        assert_eq!(removed, 1);
        assert_eq!(cache.get("meta:a"), Some(3));

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_settles_against_dispatch_key() {
        let cache: Arc<RequestCache<u32>> = Arc::new(cache_of(10));
        let c2 = Arc::clone(&cache);
        let leader = tokio::spawn(async move {
            c2.fetch("k", || async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(5)
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        // Clearing mid-flight neither cancels the fetch nor loses its result.
        cache.clear();

        assert_eq!(leader.await.unwrap().unwrap(), 5);
        assert_eq!(cache.get("k"), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_leader_releases_the_slot() {
        let cache: Arc<RequestCache<u32>> = Arc::new(cache_of(10));
        let c2 = Arc::clone(&cache);
        let leader = tokio::spawn(async move {
            c2.fetch("k", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(1)
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        leader.abort();
        let _ = leader.await;

        // The slot is free: a new fetch becomes leader instead of hanging.
        let v = cache.fetch("k", || async { Ok(2) }).await.unwrap();
        assert_eq!(v, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_reports_in_insertion_order() {
        let cache = cache_of(10);
        cache.set("first", 1, None);
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("second", 2, None);

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.entries[0].key, "first");
        assert_eq!(stats.entries[1].key, "second");
        assert!(stats.entries[0].age > stats.entries[1].age);
    }
}
