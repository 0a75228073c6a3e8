//! Short-lived lookup cache for resolved identifiers.
//!
//! Constructed once by the caller and passed by reference. A miss, an
//! expired entry or a poisoned lock all fall through to a fresh lookup.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use epi_model::{CanonicalProvince, CanonicalRegion, FactTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl_secs: 60,
        }
    }
}

/// Bounded LRU map whose entries expire after a fixed interval.
pub struct TtlCache<K: Hash + Eq, V: Clone> {
    entries: Mutex<LruCache<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        let expired = match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                return Some(value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, (Instant::now(), value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// One cache per kind of lookup. Only positive resolutions are stored.
pub struct LookupCache {
    pub provinces: TtlCache<String, CanonicalProvince>,
    pub regions: TtlCache<String, CanonicalRegion>,
    pub disease_codes: TtlCache<String, String>,
    pub fact_tables: TtlCache<String, FactTable>,
}

impl LookupCache {
    pub fn new(config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        Self {
            provinces: TtlCache::new(config.capacity, ttl),
            regions: TtlCache::new(config.capacity, ttl),
            disease_codes: TtlCache::new(config.capacity, ttl),
            fact_tables: TtlCache::new(config.capacity, ttl),
        }
    }

    pub fn clear(&self) {
        self.provinces.clear();
        self.regions.clear();
        self.disease_codes.clear();
        self.fact_tables.clear();
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire() {
        let cache: TtlCache<String, u32> = TtlCache::new(4, Duration::ZERO);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn live_entries_hit() {
        let cache: TtlCache<String, u32> = TtlCache::new(4, Duration::from_secs(300));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let cache: TtlCache<u8, u8> = TtlCache::new(2, Duration::from_secs(300));
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.get(&1), Some(1));
        cache.insert(3, 3);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_still_works() {
        let cache: TtlCache<u8, u8> = TtlCache::new(0, Duration::from_secs(300));
        cache.insert(1, 1);
        assert_eq!(cache.get(&1), Some(1));
    }
}
