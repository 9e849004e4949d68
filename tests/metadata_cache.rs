use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use headshakers::cache::{CacheConfig, TagCache, TagLimits};
use headshakers::seo::{MetadataCache, MetadataCacheMonitor, MetadataContentType};
use headshakers::seo::metadata_cache::{bobblehead_metadata_key, collection_metadata_key};

fn metadata_cache() -> (Arc<TagCache<String>>, MetadataCache<String>) {
    let store = Arc::new(TagCache::new(&CacheConfig::default()));
    let cache = MetadataCache::new(
        Arc::clone(&store),
        Arc::new(MetadataCacheMonitor::new()),
        &CacheConfig::default(),
    );
    (store, cache)
}

#[tokio::test]
async fn generator_runs_once_then_hits() {
    let (_store, cache) = metadata_cache();
    let calls = AtomicUsize::new(0);
    let key = bobblehead_metadata_key("b1");
    let tags = MetadataContentType::Bobblehead
        .tags(TagLimits::DEFAULT, "b1")
        .unwrap();

    for _ in 0..3 {
        let value = cache
            .cache_metadata(&key, Duration::from_secs(60), &tags, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("Bobblehead b1 | Head Shakers".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "Bobblehead b1 | Head Shakers");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.total_operations, 3);
}

#[tokio::test]
async fn entries_carry_seo_and_metadata_tags() {
    let (store, cache) = metadata_cache();
    let key = collection_metadata_key("c1");
    let tags = MetadataContentType::Collection
        .tags(TagLimits::DEFAULT, "c1")
        .unwrap();

    cache
        .cache_metadata(&key, Duration::from_secs(60), &tags, || async {
            Ok::<_, String>("Collection c1".to_string())
        })
        .await
        .unwrap();

    let registered = store.registry().tags_for_key(&key);
    for tag in ["seo", "metadata", "collection:c1"] {
        assert!(registered.contains(tag), "missing {tag}");
    }

    assert_eq!(store.invalidate_tag("seo"), 1);
    assert!(store.get(&key).is_none());
}

#[tokio::test]
async fn generator_errors_are_counted_and_not_cached() {
    let (store, cache) = metadata_cache();
    let key = bobblehead_metadata_key("b2");

    let result = cache
        .cache_metadata(&key, Duration::from_secs(60), &[], || async {
            Err::<String, _>("render failed".to_string())
        })
        .await;

    assert_eq!(result.unwrap_err(), "render failed");
    assert!(!store.contains_key(&key));
    let stats = cache.stats();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.hit_rate, 0.0);

    cache.reset_stats();
    assert_eq!(cache.stats().total_operations, 0);
}

#[tokio::test]
async fn batch_skips_failures_and_counts_successes() {
    let (store, cache) = metadata_cache();
    let ids = ["b1", "bad", "", "b3"];

    let cached = cache
        .batch_cache_metadata(
            MetadataContentType::Bobblehead,
            &ids,
            Duration::from_secs(60),
            |id| async move {
                if id == "bad" {
                    Err(format!("no bobblehead {id}"))
                } else {
                    Ok(format!("meta:{id}"))
                }
            },
        )
        .await;

    assert_eq!(cached, 2);
    assert_eq!(store.get(&bobblehead_metadata_key("b1")).as_deref(), Some("meta:b1"));
    assert!(store.get(&bobblehead_metadata_key("bad")).is_none());
    assert_eq!(cache.stats().errors, 1);
}

#[tokio::test]
async fn warming_populates_every_id() {
    let (store, cache) = metadata_cache();
    let ids = vec!["u1".to_string(), "u2".to_string()];

    let warmed = cache
        .warm_metadata_cache(MetadataContentType::User, &ids, |id| async move {
            Ok::<_, String>(format!("profile:{id}"))
        })
        .await;

    assert_eq!(warmed, 2);
    assert_eq!(store.len(), 2);
    assert!(store.registry().keys_for_tag("user:u2").contains("seo:metadata:user:u2"));
}

#[tokio::test]
async fn invalidate_drops_entity_metadata() {
    let (store, cache) = metadata_cache();
    let ids = ["b1", "b2"];
    cache
        .warm_metadata_cache(MetadataContentType::Bobblehead, &ids, |id| async move {
            Ok::<_, String>(id)
        })
        .await;

    assert_eq!(cache.invalidate(MetadataContentType::Bobblehead, "b1"), 1);
    assert!(store.get(&bobblehead_metadata_key("b1")).is_none());
    assert!(store.get(&bobblehead_metadata_key("b2")).is_some());

    assert_eq!(cache.invalidate(MetadataContentType::Bobblehead, ""), 0);
}

#[tokio::test]
async fn monitors_are_shared_between_caches() {
    let store = Arc::new(TagCache::new(&CacheConfig::default()));
    let monitor = Arc::new(MetadataCacheMonitor::new());
    let config = CacheConfig::default();
    let first = MetadataCache::new(Arc::clone(&store), Arc::clone(&monitor), &config);
    let second = MetadataCache::new(store, Arc::clone(&monitor), &config);

    let key = bobblehead_metadata_key("shared");
    for cache in [&first, &second] {
        cache
            .cache_metadata(&key, Duration::from_secs(60), &[], || async {
                Ok::<_, String>("shared".to_string())
            })
            .await
            .unwrap();
    }

    let stats = monitor.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.hit_rate, 50.0);
    assert_eq!(first.monitor().stats(), stats);
}

#[tokio::test]
async fn configured_tag_limits_apply_to_metadata_tags() {
    let long_id = "b".repeat(95);
    let ids = [long_id.as_str()];
    let generate = |id: String| async move { Ok::<_, String>(format!("meta:{id}")) };

    let (_store, default_cache) = metadata_cache();
    assert_eq!(
        default_cache
            .warm_metadata_cache(MetadataContentType::Bobblehead, &ids, generate)
            .await,
        0
    );

    let config = CacheConfig {
        limits: TagLimits {
            max_tags: 50,
            max_tag_length: 200,
        },
        ..Default::default()
    };
    let store = Arc::new(TagCache::new(&config));
    let cache = MetadataCache::new(
        Arc::clone(&store),
        Arc::new(MetadataCacheMonitor::new()),
        &config,
    );

    let warmed = cache
        .warm_metadata_cache(MetadataContentType::Bobblehead, &ids, generate)
        .await;
    assert_eq!(warmed, 1);
    assert!(store.get(&bobblehead_metadata_key(&long_id)).is_some());
    assert_eq!(cache.invalidate(MetadataContentType::Bobblehead, &long_id), 1);
}
