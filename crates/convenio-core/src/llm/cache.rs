//! Time-bounded in-memory cache
//!
//! Writes are idempotent for a given key, so concurrent populations of the
//! same key race safely with last-write-wins; no locking beyond the map's
//! own RwLock is needed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: SystemTime,
}

/// Keyed TTL cache with a get/set interface, injectable wherever a
/// time-bounded cache is needed.
pub struct TtlCache<K, V> {
    entries: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create cache with the given default TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    /// Get cached value if present and not expired
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if SystemTime::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Set cached value with the default TTL
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Set cached value with a custom TTL
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: SystemTime::now() + ttl,
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, entry);
        }
    }

    /// Drop expired entries
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let now = SystemTime::now();
            entries.retain(|_, entry| now < entry.expires_at);
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            default_ttl: self.default_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(60));
        cache.set("key1".to_string(), 1);
        assert_eq!(cache.get(&"key1".to_string()), Some(1));
        assert_eq!(cache.get(&"key2".to_string()), None);
    }

    #[test]
    fn test_cache_expiry() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_millis(50));
        cache.set("key1".to_string(), 1);
        assert_eq!(cache.get(&"key1".to_string()), Some(1));

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get(&"key1".to_string()), None);
    }

    #[test]
    fn test_cache_cleanup() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_millis(50));
        cache.set("key1".to_string(), 1);
        cache.set("key2".to_string(), 2);
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(80));
        cache.cleanup();
        assert_eq!(cache.len(), 0);
    }
}
