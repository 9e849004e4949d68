//! Maps "this changed" events to the tags that must be invalidated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::builder::CacheTagBuilder;
use super::error::CacheTagError;
use super::generators::{self, Tags};
use super::tags::{AggregateKind, EntityKind, FeatureKind, TagLimits};

pub fn on_analytics_view(limits: TagLimits, kind: EntityKind, id: &str) -> Tags {
    generators::analytics::view(limits, kind, id)
}

pub fn on_bobblehead_change(
    limits: TagLimits,
    id: &str,
    user_id: &str,
    collection_id: Option<&str>,
) -> Tags {
    generators::bobblehead::update(limits, id, user_id, collection_id)
}

pub fn on_collection_change(limits: TagLimits, id: &str, user_id: &str) -> Tags {
    generators::collection::update(limits, id, user_id)
}

/// Tags for a comment created or edited on `kind`/`id`.
///
/// A reply also invalidates the parent comment and its thread so readers of
/// the thread see the new reply count.
pub fn on_comment_change(
    limits: TagLimits,
    kind: EntityKind,
    id: &str,
    comment_id: Option<&str>,
    parent_comment_id: Option<&str>,
) -> Tags {
    let mut tags = generators::social::comments(limits, kind, id)?;

    if let Some(comment_id) = comment_id {
        tags.extend(generators::social::comment(limits, comment_id, None)?);
    }

    if let Some(parent) = parent_comment_id {
        tags.extend(generators::social::comment_thread(limits, parent)?);
        tags.extend(generators::social::comment(limits, parent, None)?);
    }

    Ok(dedup(tags))
}

pub fn on_featured_content_change(limits: TagLimits) -> Tags {
    generators::featured::update(limits)
}

/// Broad invalidation for bulk imports and similar sweeping changes.
pub fn on_major_data_change(limits: TagLimits) -> Tags {
    let mut builder = CacheTagBuilder::with_limits(limits);
    builder
        .add_feature(FeatureKind::Featured)?
        .add_feature(FeatureKind::Popular)?
        .add_feature(FeatureKind::Public)?
        .add_aggregate(AggregateKind::GlobalStats, None)?
        .add_aggregate(AggregateKind::Trending, None)?;
    Ok(builder.into_tags())
}

pub fn on_social_interaction(
    limits: TagLimits,
    kind: EntityKind,
    id: &str,
    user_id: &str,
) -> Tags {
    match kind {
        EntityKind::Bobblehead | EntityKind::Collection | EntityKind::Comment => {
            generators::social::like(limits, kind, id, user_id)
        }
        other => Err(CacheTagError::unsupported(
            "Social interaction invalidation",
            "'bobblehead', 'collection', or 'comment'",
            other,
        )),
    }
}

pub fn on_trending_update(limits: TagLimits) -> Tags {
    generators::analytics::trending(limits)
}

pub fn on_user_change(limits: TagLimits, user_id: &str) -> Tags {
    generators::user::update(limits, user_id)
}

/// An application-level change, dispatched to the matching tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum InvalidationEvent {
    AnalyticsView {
        entity_type: EntityKind,
        entity_id: String,
    },
    BobbleheadChange {
        bobblehead_id: String,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection_id: Option<String>,
    },
    CollectionChange {
        collection_id: String,
        user_id: String,
    },
    CommentChange {
        entity_type: EntityKind,
        entity_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_comment_id: Option<String>,
    },
    FeaturedContentChange,
    MajorDataChange,
    SocialInteraction {
        entity_type: EntityKind,
        entity_id: String,
        user_id: String,
    },
    TrendingUpdate,
    UserChange {
        user_id: String,
    },
}

impl InvalidationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InvalidationEvent::AnalyticsView { .. } => "analytics-view",
            InvalidationEvent::BobbleheadChange { .. } => "bobblehead-change",
            InvalidationEvent::CollectionChange { .. } => "collection-change",
            InvalidationEvent::CommentChange { .. } => "comment-change",
            InvalidationEvent::FeaturedContentChange => "featured-content-change",
            InvalidationEvent::MajorDataChange => "major-data-change",
            InvalidationEvent::SocialInteraction { .. } => "social-interaction",
            InvalidationEvent::TrendingUpdate => "trending-update",
            InvalidationEvent::UserChange { .. } => "user-change",
        }
    }

    pub fn tags(&self, limits: TagLimits) -> Tags {
        match self {
            InvalidationEvent::AnalyticsView {
                entity_type,
                entity_id,
            } => on_analytics_view(limits, *entity_type, entity_id),
            InvalidationEvent::BobbleheadChange {
                bobblehead_id,
                user_id,
                collection_id,
            } => on_bobblehead_change(
                limits,
                bobblehead_id,
                user_id,
                collection_id.as_deref(),
            ),
            InvalidationEvent::CollectionChange {
                collection_id,
                user_id,
            } => on_collection_change(limits, collection_id, user_id),
            InvalidationEvent::CommentChange {
                entity_type,
                entity_id,
                comment_id,
                parent_comment_id,
            } => on_comment_change(
                limits,
                *entity_type,
                entity_id,
                comment_id.as_deref(),
                parent_comment_id.as_deref(),
            ),
            InvalidationEvent::FeaturedContentChange => on_featured_content_change(limits),
            InvalidationEvent::MajorDataChange => on_major_data_change(limits),
            InvalidationEvent::SocialInteraction {
                entity_type,
                entity_id,
                user_id,
            } => on_social_interaction(limits, *entity_type, entity_id, user_id),
            InvalidationEvent::TrendingUpdate => on_trending_update(limits),
            InvalidationEvent::UserChange { user_id } => on_user_change(limits, user_id),
        }
    }
}

/// Resolve several events into one de-duplicated tag list.
///
/// Fails on the first event whose tag set cannot be computed.
pub fn tags_for_events<'a, I>(events: I, limits: TagLimits) -> Tags
where
    I: IntoIterator<Item = &'a InvalidationEvent>,
{
    let mut merged = Vec::new();
    for event in events {
        merged.extend(event.tags(limits)?);
    }
    Ok(dedup(merged))
}

fn dedup(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
