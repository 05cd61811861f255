//! Bounded LRU caches shared by the RPC client, reputation detector, and
//! engine. Each is a thin, lock-guarded wrapper so callers can hold the
//! handle across `.await` points without holding the lock itself.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

/// Minimum capacity mandated for every RPC/reputation/analysis cache.
pub const MIN_CAPACITY: usize = 256;

/// A cloneable, async-safe LRU cache handle.
#[derive(Clone)]
pub struct SharedCache<K, V> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K: Eq + Hash, V: Clone> SharedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock().await;
        guard.get(key).cloned()
    }

    pub async fn put(&self, key: K, value: V) {
        let mut guard = self.inner.lock().await;
        guard.put(key, value);
    }

    /// Drop every entry. Used by tests that need deterministic cache misses.
    pub async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        guard.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache: SharedCache<String, String> = SharedCache::new(MIN_CAPACITY);
        cache.put("a".to_string(), "1".to_string()).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some("1".to_string()));
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache: SharedCache<String, String> = SharedCache::new(MIN_CAPACITY);
        assert_eq!(cache.get(&"missing".to_string()).await, None);
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let cache: SharedCache<String, String> = SharedCache::new(MIN_CAPACITY);
        cache.put("a".to_string(), "1".to_string()).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn eviction_respects_capacity() {
        let cache: SharedCache<u32, u32> = SharedCache::new(2);
        cache.put(1, 1).await;
        cache.put(2, 2).await;
        cache.put(3, 3).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&1).await, None);
    }
}
