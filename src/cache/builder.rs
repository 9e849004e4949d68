//! Tag accumulation.

use std::collections::HashSet;

use super::error::CacheTagError;
use super::tags::{AggregateKind, EntityKind, FeatureKind, RelationshipKind, TagLimits};

/// Accumulates a de-duplicated, bounded set of cache tags for one cache write.
///
/// Tags keep their first-insertion order. Every mutator checks the count
/// limit before doing anything else, so a builder never holds more than
/// `limits.max_tags` tags.
#[derive(Debug, Clone, Default)]
pub struct CacheTagBuilder {
    limits: TagLimits,
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl CacheTagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: TagLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> TagLimits {
        self.limits
    }

    /// Add the tag for one specific domain object.
    pub fn add_entity(&mut self, kind: EntityKind, id: &str) -> Result<&mut Self, CacheTagError> {
        self.ensure_capacity()?;
        if id.is_empty() {
            return Err(CacheTagError::EmptyId { what: "Entity" });
        }
        self.insert(kind.tag(id))
    }

    /// Add the tag for a one-to-many association owned by `id`.
    pub fn add_relationship(
        &mut self,
        kind: RelationshipKind,
        id: &str,
    ) -> Result<&mut Self, CacheTagError> {
        self.ensure_capacity()?;
        if id.is_empty() {
            return Err(CacheTagError::EmptyId {
                what: "Relationship",
            });
        }
        self.insert(kind.tag(id))
    }

    pub fn add_feature(&mut self, kind: FeatureKind) -> Result<&mut Self, CacheTagError> {
        self.ensure_capacity()?;
        self.insert(kind.tag())
    }

    /// Add an aggregate tag. `UserStats` without an id adds nothing.
    pub fn add_aggregate(
        &mut self,
        kind: AggregateKind,
        id: Option<&str>,
    ) -> Result<&mut Self, CacheTagError> {
        self.ensure_capacity()?;
        match kind.tag(id.filter(|id| !id.is_empty())) {
            Some(tag) => self.insert(tag),
            None => Ok(self),
        }
    }

    pub fn add_custom(&mut self, tag: impl Into<String>) -> Result<&mut Self, CacheTagError> {
        self.ensure_capacity()?;
        self.insert(tag.into())
    }

    /// Return the accumulated tags in insertion order.
    pub fn build(&self) -> Vec<String> {
        self.ordered.clone()
    }

    /// Consume the builder, returning its tags.
    pub fn into_tags(self) -> Vec<String> {
        self.ordered
    }

    pub fn tag_count(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.ordered.clear();
        self.seen.clear();
        self
    }

    fn ensure_capacity(&self) -> Result<(), CacheTagError> {
        let count = self.ordered.len();
        if count >= self.limits.max_tags {
            return Err(CacheTagError::TagLimitExceeded {
                count,
                max: self.limits.max_tags,
            });
        }
        Ok(())
    }

    fn insert(&mut self, tag: String) -> Result<&mut Self, CacheTagError> {
        validate_tag(&tag, self.limits.max_tag_length)?;
        if self.seen.insert(tag.clone()) {
            self.ordered.push(tag);
        }
        Ok(self)
    }
}

/// Check a tag against the emptiness and length rules.
pub fn validate_tag(tag: &str, max_length: usize) -> Result<(), CacheTagError> {
    if tag.is_empty() {
        return Err(CacheTagError::EmptyTag);
    }
    let length = tag.chars().count();
    if length > max_length {
        return Err(CacheTagError::TagTooLong {
            length,
            max: max_length,
        });
    }
    Ok(())
}
