//! Bidirectional tag registry.
//!
//! Tracks which cache keys carry which tags so a tag invalidation can find
//! every affected entry, and an eviction can drop its tag mappings.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

#[derive(Debug, Default)]
struct Mappings {
    tag_to_keys: HashMap<String, HashSet<String>>,
    key_to_tags: HashMap<String, HashSet<String>>,
}

/// Tracks tag → keys and key → tags mappings.
///
/// Both directions live behind one lock so they never disagree.
#[derive(Debug, Default)]
pub struct TagRegistry {
    mappings: RwLock<Mappings>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under each of `tags`, replacing any previous tags for it.
    pub fn register<I, S>(&self, key: &str, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mappings = rw_write(&self.mappings, SOURCE, "register");
        detach(&mut mappings, key);

        let tags: HashSet<String> = tags.into_iter().map(Into::into).collect();
        for tag in &tags {
            mappings
                .tag_to_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        mappings.key_to_tags.insert(key.to_string(), tags);
    }

    pub fn keys_for_tag(&self, tag: &str) -> HashSet<String> {
        rw_read(&self.mappings, SOURCE, "keys_for_tag")
            .tag_to_keys
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tags_for_key(&self, key: &str) -> HashSet<String> {
        rw_read(&self.mappings, SOURCE, "tags_for_key")
            .key_to_tags
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a key and every tag mapping that pointed at it.
    pub fn unregister(&self, key: &str) {
        let mut mappings = rw_write(&self.mappings, SOURCE, "unregister");
        detach(&mut mappings, key);
    }

    /// Remove a tag and every key it points at.
    ///
    /// Returns the affected keys. Their remaining tag mappings are dropped as
    /// well, since the caller evicts those entries.
    pub fn unregister_tag(&self, tag: &str) -> HashSet<String> {
        let mut mappings = rw_write(&self.mappings, SOURCE, "unregister_tag");
        let affected = mappings.tag_to_keys.remove(tag).unwrap_or_default();
        for key in &affected {
            detach(&mut mappings, key);
        }
        affected
    }

    pub fn clear(&self) {
        let mut mappings = rw_write(&self.mappings, SOURCE, "clear");
        mappings.tag_to_keys.clear();
        mappings.key_to_tags.clear();
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.mappings, SOURCE, "tag_count").tag_to_keys.len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.mappings, SOURCE, "key_count").key_to_tags.len()
    }
}

fn detach(mappings: &mut Mappings, key: &str) {
    let Some(tags) = mappings.key_to_tags.remove(key) else {
        return;
    };
    for tag in tags {
        if let Some(keys) = mappings.tag_to_keys.get_mut(&tag) {
            keys.remove(key);
            if keys.is_empty() {
                mappings.tag_to_keys.remove(&tag);
            }
        }
    }
}
