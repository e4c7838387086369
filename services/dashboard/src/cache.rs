//! Time-bounded memoization of remote fetches.
//!
//! Keys name the fetch and its arguments (e.g. `wind:2024-03-15T00Z`).
//! Only successful results are stored, so a reload after a failure goes
//! back to the remote service.
//!
//! ## Eviction Strategy
//! - LRU eviction once `capacity` entries are held
//! - TTL-based expiration on read (lazy)

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

struct CachedValue<V> {
    value: V,
    fetched_at: Instant,
}

/// Counters for a [`FetchCache`].
#[derive(Default)]
pub struct FetchCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
}

/// Snapshot of the counters, for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchCacheSnapshot {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

/// LRU cache of fetch results with a fixed time-to-live.
pub struct FetchCache<V> {
    entries: Mutex<LruCache<String, CachedValue<V>>>,
    ttl: Duration,
    stats: FetchCacheStats,
}

impl<V: Clone> FetchCache<V> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            stats: FetchCacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key`, unless absent or older than the TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() <= self.ttl => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Fetch cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, expired, "Fetch cache miss");
        None
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CachedValue {
            value,
            fetched_at: Instant::now(),
        };
        self.entries.lock().await.put(key.into(), entry);
    }

    /// Return the cached value or run `fetch`, storing its result only
    /// when it succeeds.
    ///
    /// The lock is not held while fetching; two concurrent misses for the
    /// same key both fetch and the later result wins.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop every entry, returning how many were held.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn snapshot(&self) -> FetchCacheSnapshot {
        FetchCacheSnapshot {
            entries: self.len().await,
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            expired: self.stats.expired.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_hit_after_success() {
        let cache = FetchCache::new(4, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, String> = cache
                .get_or_try_fetch("wind:2024-03-15T00Z", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.snapshot().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: FetchCache<u32> = FetchCache::new(4, Duration::from_secs(60));

        let first: Result<u32, String> = cache
            .get_or_try_fetch("waves:2024-03-15", || async { Err("401".to_string()) })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty().await);

        let second: Result<u32, String> = cache
            .get_or_try_fetch("waves:2024-03-15", || async { Ok(3) })
            .await;
        assert_eq!(second, Ok(3));
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let cache = FetchCache::new(4, Duration::ZERO);
        cache.insert("k", 1u32).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.snapshot().await.expired, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let cache = FetchCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1u32).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.get("a").await, Some(1));
        cache.insert("c", 3).await;

        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = FetchCache::new(4, Duration::from_secs(60));
        cache.insert("a", 1u32).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.get("a").await, None);
    }
}
