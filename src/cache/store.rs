//! Tag-indexed cache storage.
//!
//! Values are stored under a string key together with the tags they depend
//! on. Lookups are create-on-miss / read-on-hit; invalidating any tag drops
//! every entry carrying it. Capacity is bounded with LRU eviction.

use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::{debug, trace};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};
use super::registry::TagRegistry;

const SOURCE: &str = "cache::store";

/// Whether a read-through lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CachedEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory tag cache.
///
/// Lock order is always entries, then registry.
pub struct TagCache<V> {
    enabled: bool,
    entries: RwLock<LruCache<String, CachedEntry<V>>>,
    registry: TagRegistry,
}

impl<V: Clone> TagCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            registry: TagRegistry::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached value for `key`, dropping it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                counter!("headshakers_cache_hit_total").increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.registry.unregister(key);
            trace!(key, "Expired cache entry dropped");
        }
        counter!("headshakers_cache_miss_total").increment(1);
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "contains_key")
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Store `value` under `key` with the given tags.
    ///
    /// Re-inserting a key replaces both its value and its tags.
    pub fn insert<I>(&self, key: &str, value: V, tags: I, ttl: Option<Duration>)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if !self.enabled {
            return;
        }

        let entry = CachedEntry {
            value,
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };

        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        let evicted = entries.push(key.to_string(), entry);
        self.registry.register(key, tags);

        match evicted {
            Some((evicted_key, _)) if evicted_key != key => {
                self.registry.unregister(&evicted_key);
                counter!("headshakers_cache_evict_total").increment(1);
                debug!(key = %evicted_key, "Cache entry evicted for capacity");
            }
            _ => {}
        }
    }

    /// Read-through lookup: return the cached value or load, store and return it.
    ///
    /// Loader errors are returned as-is and nothing is stored.
    pub async fn get_or_insert_with<F, Fut, E>(
        &self,
        key: &str,
        tags: &[String],
        ttl: Option<Duration>,
        loader: F,
    ) -> Result<(V, CacheLookup), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok((value, CacheLookup::Hit));
        }

        let value = loader().await?;
        self.insert(key, value.clone(), tags.iter().cloned(), ttl);
        Ok((value, CacheLookup::Miss))
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let mut entries = rw_write(&self.entries, SOURCE, "remove");
        let removed = entries.pop(key);
        self.registry.unregister(key);
        removed.map(|entry| entry.value)
    }

    /// Drop every entry tagged with `tag`. Returns how many were removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_tag");
        let removed = self
            .registry
            .unregister_tag(tag)
            .into_iter()
            .filter(|key| entries.pop(key).is_some())
            .count();
        debug!(tag, removed, "Cache tag invalidated");
        removed
    }

    /// Drop every entry carrying any of `tags`, counting each entry once.
    pub fn invalidate_tags<I>(&self, tags: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        tags.into_iter()
            .map(|tag| self.invalidate_tag(tag.as_ref()))
            .sum()
    }

    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        entries.clear();
        self.registry.clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn cache(capacity: usize) -> TagCache<String> {
        TagCache::new(&CacheConfig {
            capacity,
            ..Default::default()
        })
    }

    #[test]
    fn insert_then_get() {
        let cache = cache(10);
        assert!(cache.get("k").is_none());

        cache.insert("k", "v".to_string(), ["bobblehead:1"], None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert!(cache.contains_key("k"));
    }

    #[test]
    fn invalidating_a_tag_drops_matching_entries_only() {
        let cache = cache(10);
        cache.insert("a", "1".to_string(), ["bobblehead:1", "public"], None);
        cache.insert("b", "2".to_string(), ["bobblehead:2", "public"], None);
        cache.insert("c", "3".to_string(), ["user:9"], None);

        assert_eq!(cache.invalidate_tag("bobblehead:1"), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());

        assert_eq!(cache.invalidate_tag("public"), 1);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("c").as_deref(), Some("3"));

        assert_eq!(cache.invalidate_tag("unrelated"), 0);
    }

    #[test]
    fn invalidate_tags_counts_each_entry_once() {
        let cache = cache(10);
        cache.insert("a", "1".to_string(), ["x", "y"], None);
        cache.insert("b", "2".to_string(), ["y"], None);

        assert_eq!(cache.invalidate_tags(["x", "y"]), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.registry().tag_count(), 0);
    }

    #[test]
    fn expired_entries_miss() {
        let cache = cache(10);
        cache.insert("k", "v".to_string(), ["t"], Some(Duration::ZERO));

        assert!(!cache.contains_key("k"));
        assert!(cache.get("k").is_none());
        assert!(cache.registry().keys_for_tag("t").is_empty());
    }

    #[test]
    fn lru_eviction_cleans_registry() {
        let cache = cache(2);
        cache.insert("a", "1".to_string(), ["ta"], None);
        cache.insert("b", "2".to_string(), ["tb"], None);
        cache.insert("c", "3".to_string(), ["tc"], None);

        assert!(cache.get("a").is_none());
        assert!(cache.registry().keys_for_tag("ta").is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinsert_replaces_tags() {
        let cache = cache(10);
        cache.insert("k", "v1".to_string(), ["old"], None);
        cache.insert("k", "v2".to_string(), ["new"], None);

        assert_eq!(cache.invalidate_tag("old"), 0);
        assert_eq!(cache.get("k").as_deref(), Some("v2"));
        assert_eq!(cache.invalidate_tag("new"), 1);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache: TagCache<String> = TagCache::new(&CacheConfig {
            enabled: false,
            ..Default::default()
        });
        cache.insert("k", "v".to_string(), ["t"], None);
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let cache = cache(10);
        cache.insert("a", "1".to_string(), ["t"], None);
        cache.insert("b", "2".to_string(), ["t"], None);

        assert_eq!(cache.remove("a").as_deref(), Some("1"));
        assert_eq!(cache.registry().keys_for_tag("t").len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.registry().key_count(), 0);
    }

    #[tokio::test]
    async fn read_through_loads_once() {
        let cache = cache(10);
        let tags = vec!["collection:c1".to_string()];

        let (value, lookup) = cache
            .get_or_insert_with("k", &tags, None, || async {
                Ok::<_, std::io::Error>("loaded".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "loaded");
        assert_eq!(lookup, CacheLookup::Miss);

        let (value, lookup) = cache
            .get_or_insert_with("k", &tags, None, || async {
                Err::<String, _>(std::io::Error::other("loader must not run"))
            })
            .await
            .unwrap();
        assert_eq!(value, "loaded");
        assert_eq!(lookup, CacheLookup::Hit);
    }

    #[tokio::test]
    async fn read_through_errors_store_nothing() {
        let cache = cache(10);
        let result = cache
            .get_or_insert_with("k", &[], None, || async {
                Err::<String, _>(std::io::Error::other("boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains_key("k"));
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let cache = cache(10);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        cache.insert("k", "v".to_string(), ["t"], None);
        assert!(cache.get("k").is_some());
    }
}
