use std::collections::HashMap;

use headshakers::cache::{CacheConfig, TagCache};
use headshakers::infra::telemetry::describe_metrics;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

#[test]
fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    describe_metrics();

    let store: TagCache<String> = TagCache::new(&CacheConfig {
        capacity: 1,
        ..Default::default()
    });

    // miss, hit, then evict "a" by inserting "b"
    assert!(store.get("a").is_none());
    store.insert("a", "1".to_string(), ["bobblehead:1"], None);
    assert!(store.get("a").is_some());
    store.insert("b", "2".to_string(), ["bobblehead:2"], None);

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    for (metric, expected) in [
        ("headshakers_cache_hit_total", 1),
        ("headshakers_cache_miss_total", 1),
        ("headshakers_cache_evict_total", 1),
    ] {
        assert_eq!(
            counters.get(metric).copied(),
            Some(expected),
            "unexpected value for {metric}"
        );
    }
}
