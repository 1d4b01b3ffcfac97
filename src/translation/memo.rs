//! In-process memo cache: bounded LRU in front of the persistent store.

use crate::translation::key::CacheKey;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Default number of translations kept in memory.
pub const DEFAULT_MEMO_CAPACITY: usize = 10_000;

/// Process-local key → translation map with least-recently-used eviction.
///
/// Shared across all concurrent requests via `Arc`. The lock is never held
/// across an `.await`.
pub struct MemoCache {
    inner: Mutex<LruCache<CacheKey, String>>,
}

impl MemoCache {
    /// Create a cache holding at most `capacity` entries (a zero capacity is
    /// raised to one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a translation, marking it as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, translated: String) {
        self.lock().put(key, translated);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, String>> {
        // Poisoning is ignored: entries are independent strings.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new(DEFAULT_MEMO_CAPACITY)
    }
}

impl std::fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;

    fn key(text: &str) -> CacheKey {
        CacheKey::new(text, Locale::English)
    }

    #[test]
    fn test_get_missing() {
        let memo = MemoCache::new(4);
        assert_eq!(memo.get(&key("Salut")), None);
        assert!(memo.is_empty());
    }

    #[test]
    fn test_insert_then_get() {
        let memo = MemoCache::new(4);
        memo.insert(key("Salut"), "Hello".to_string());
        assert_eq!(memo.get(&key("Salut")), Some("Hello".to_string()));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_locales_do_not_collide() {
        let memo = MemoCache::new(4);
        memo.insert(CacheKey::new("Salut", Locale::English), "Hello".to_string());
        assert_eq!(memo.get(&CacheKey::new("Salut", Locale::Hungarian)), None);
    }

    #[test]
    fn test_bounded_by_capacity() {
        let memo = MemoCache::new(3);
        for i in 0..10 {
            memo.insert(key(&format!("text {}", i)), format!("translated {}", i));
        }
        assert_eq!(memo.len(), 3);
        assert_eq!(memo.capacity(), 3);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let memo = MemoCache::new(2);
        memo.insert(key("a"), "A".to_string());
        memo.insert(key("b"), "B".to_string());

        // Touch "a" so "b" becomes the eviction candidate
        assert!(memo.get(&key("a")).is_some());
        memo.insert(key("c"), "C".to_string());

        assert_eq!(memo.get(&key("a")), Some("A".to_string()));
        assert_eq!(memo.get(&key("b")), None);
        assert_eq!(memo.get(&key("c")), Some("C".to_string()));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let memo = MemoCache::new(0);
        assert_eq!(memo.capacity(), 1);
        memo.insert(key("a"), "A".to_string());
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_clear() {
        let memo = MemoCache::default();
        memo.insert(key("a"), "A".to_string());
        memo.clear();
        assert!(memo.is_empty());
        assert_eq!(memo.capacity(), DEFAULT_MEMO_CAPACITY);
    }
}
