//! SEO metadata caching.
//!
//! Wraps metadata generation with the tag cache so a bobblehead, collection
//! or user edit invalidates its rendered metadata. Hit/miss/error counters
//! live in an explicitly constructed [`MetadataCacheMonitor`] that callers
//! own and share, so tests can inspect a fresh one.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{
    CacheConfig, CacheLookup, CacheTagBuilder, CacheTagError, EntityKind, TagCache, TagLimits,
    TtlPresets, generators,
};

const SEO_TAG: &str = "seo";
const METADATA_TAG: &str = "metadata";

/// Content types that have cached metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataContentType {
    Bobblehead,
    Collection,
    User,
}

impl MetadataContentType {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            MetadataContentType::Bobblehead => EntityKind::Bobblehead,
            MetadataContentType::Collection => EntityKind::Collection,
            MetadataContentType::User => EntityKind::User,
        }
    }

    /// Tags a cached metadata value for this content depends on.
    pub fn tags(self, limits: TagLimits, id: &str) -> Result<Vec<String>, CacheTagError> {
        match self {
            MetadataContentType::Bobblehead => generators::bobblehead::read(limits, id, None),
            MetadataContentType::Collection => generators::collection::read(limits, id, None),
            MetadataContentType::User => generators::user::profile(limits, id),
        }
    }
}

pub fn bobblehead_metadata_key(bobblehead_id: &str) -> String {
    format!("seo:metadata:bobblehead:{bobblehead_id}")
}

pub fn collection_metadata_key(collection_id: &str) -> String {
    format!("seo:metadata:collection:{collection_id}")
}

pub fn user_metadata_key(user_id: &str) -> String {
    format!("seo:metadata:user:{user_id}")
}

pub fn metadata_key(content_type: MetadataContentType, id: &str) -> String {
    match content_type {
        MetadataContentType::Bobblehead => bobblehead_metadata_key(id),
        MetadataContentType::Collection => collection_metadata_key(id),
        MetadataContentType::User => user_metadata_key(id),
    }
}

/// Point-in-time copy of the monitor counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetadataCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub total_operations: u64,
    /// Percentage of operations served from cache.
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
pub struct MetadataCacheMonitor {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl MetadataCacheMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> MetadataCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let total_operations = hits + misses + errors;
        let hit_rate = if total_operations > 0 {
            hits as f64 / total_operations as f64 * 100.0
        } else {
            0.0
        };

        MetadataCacheStats {
            hits,
            misses,
            errors,
            total_operations,
            hit_rate,
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// Metadata cache over a shared tag cache.
pub struct MetadataCache<V> {
    store: Arc<TagCache<V>>,
    monitor: Arc<MetadataCacheMonitor>,
    ttl: TtlPresets,
    limits: TagLimits,
}

impl<V: Clone> MetadataCache<V> {
    /// TTL presets and tag limits are taken from `config`.
    pub fn new(
        store: Arc<TagCache<V>>,
        monitor: Arc<MetadataCacheMonitor>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            monitor,
            ttl: config.ttl,
            limits: config.limits,
        }
    }

    pub fn monitor(&self) -> &Arc<MetadataCacheMonitor> {
        &self.monitor
    }

    /// Return cached metadata for `key`, generating and storing it on a miss.
    ///
    /// The entry is always tagged `seo` and `metadata` in addition to `tags`.
    /// Generator failures are counted and returned; nothing is cached.
    pub async fn cache_metadata<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        tags: &[String],
        generator: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let mut all_tags = Vec::with_capacity(tags.len() + 2);
        all_tags.push(SEO_TAG.to_string());
        all_tags.push(METADATA_TAG.to_string());
        all_tags.extend(tags.iter().cloned());

        match self
            .store
            .get_or_insert_with(key, &all_tags, Some(ttl), generator)
            .await
        {
            Ok((value, CacheLookup::Hit)) => {
                self.monitor.record_hit();
                Ok(value)
            }
            Ok((value, CacheLookup::Miss)) => {
                self.monitor.record_miss();
                Ok(value)
            }
            Err(err) => {
                self.monitor.record_error();
                debug!(key, error = %err, "Metadata generation failed");
                Err(err)
            }
        }
    }

    /// Cache metadata for many items of one content type concurrently.
    ///
    /// Individual failures are logged and skipped. Returns how many items
    /// ended up cached.
    pub async fn batch_cache_metadata<S, F, Fut, E>(
        &self,
        content_type: MetadataContentType,
        ids: &[S],
        ttl: Duration,
        generator: F,
    ) -> usize
    where
        S: AsRef<str>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let generator = &generator;
        let results = join_all(ids.iter().map(|id| async move {
            let id = id.as_ref();
            let tags = match content_type.tags(self.limits, id) {
                Ok(tags) => tags,
                Err(err) => {
                    warn!(?content_type, id, error = %err, "Skipping metadata with invalid tags");
                    return false;
                }
            };
            let key = metadata_key(content_type, id);
            let owned_id = id.to_string();
            match self
                .cache_metadata(&key, ttl, &tags, || generator(owned_id))
                .await
            {
                Ok(_) => true,
                Err(err) => {
                    warn!(?content_type, id, error = %err, "Failed to cache metadata");
                    false
                }
            }
        }))
        .await;

        results.into_iter().filter(|cached| *cached).count()
    }

    /// Pre-populate metadata for content likely to be requested soon, such as
    /// featured or trending items. Uses the extended TTL.
    pub async fn warm_metadata_cache<S, F, Fut, E>(
        &self,
        content_type: MetadataContentType,
        ids: &[S],
        generator: F,
    ) -> usize
    where
        S: AsRef<str>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let warmed = self
            .batch_cache_metadata(content_type, ids, self.ttl.extended, generator)
            .await;
        debug!(?content_type, requested = ids.len(), warmed, "Metadata cache warmed");
        warmed
    }

    /// Drop cached metadata for one entity. Returns how many entries went.
    ///
    /// Invalidates by entity tag, so other entries depending on the same
    /// entity are dropped too.
    pub fn invalidate(&self, content_type: MetadataContentType, id: &str) -> usize {
        let mut builder = CacheTagBuilder::with_limits(self.limits);
        match builder.add_entity(content_type.entity_kind(), id) {
            Ok(_) => self.store.invalidate_tags(builder.build()),
            Err(err) => {
                warn!(?content_type, id, error = %err, "Skipping metadata invalidation");
                0
            }
        }
    }

    pub fn stats(&self) -> MetadataCacheStats {
        self.monitor.stats()
    }

    pub fn reset_stats(&self) {
        self.monitor.reset();
    }
}
