//! Canonical tag sets, one per (entity, operation) pair.
//!
//! The set is operation-sensitive: deletes also touch the rollups that
//! creation and field edits leave alone, because removal is what makes
//! global stats and popularity lists stale.
//!
//! Every generator builds under the caller's [`TagLimits`], so configured
//! limits apply to the tags as they are produced.

use super::builder::CacheTagBuilder;
use super::error::CacheTagError;
use super::tags::{EntityKind, TagLimits};

pub type Tags = Result<Vec<String>, CacheTagError>;

fn ensure_supported(
    operation: &'static str,
    supported: &'static str,
    allowed: &[EntityKind],
    kind: EntityKind,
) -> Result<(), CacheTagError> {
    if allowed.contains(&kind) {
        Ok(())
    } else {
        Err(CacheTagError::unsupported(operation, supported, kind))
    }
}

pub mod analytics {
    use super::*;
    use crate::cache::tags::{AggregateKind, FeatureKind};

    pub fn trending(limits: TagLimits) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_aggregate(AggregateKind::Trending, None)?
            .add_feature(FeatureKind::Popular)?;
        Ok(builder.into_tags())
    }

    /// Tags touched when a view is recorded for a bobblehead or collection.
    pub fn view(limits: TagLimits, kind: EntityKind, id: &str) -> Tags {
        ensure_supported(
            "Analytics view",
            "'bobblehead' or 'collection'",
            &[EntityKind::Bobblehead, EntityKind::Collection],
            kind,
        )?;
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(kind, id)?
            .add_custom(format!("analytics:{kind}"))?
            .add_aggregate(AggregateKind::GlobalStats, None)?;
        Ok(builder.into_tags())
    }
}

pub mod bobblehead {
    use super::*;
    use crate::cache::tags::{AggregateKind, FeatureKind, RelationshipKind};

    fn base(limits: TagLimits, id: &str, user_id: &str) -> Result<CacheTagBuilder, CacheTagError> {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::Bobblehead, id)?
            .add_entity(EntityKind::User, user_id)?
            .add_relationship(RelationshipKind::UserBobbleheads, user_id)?
            .add_feature(FeatureKind::Public)?;
        Ok(builder)
    }

    fn with_collection(
        mut builder: CacheTagBuilder,
        collection_id: Option<&str>,
    ) -> Tags {
        if let Some(collection_id) = collection_id {
            builder
                .add_entity(EntityKind::Collection, collection_id)?
                .add_relationship(RelationshipKind::CollectionBobbleheads, collection_id)?;
        }
        Ok(builder.into_tags())
    }

    pub fn create(limits: TagLimits, id: &str, user_id: &str, collection_id: Option<&str>) -> Tags {
        with_collection(base(limits, id, user_id)?, collection_id)
    }

    pub fn update(limits: TagLimits, id: &str, user_id: &str, collection_id: Option<&str>) -> Tags {
        let mut builder = base(limits, id, user_id)?;
        builder.add_feature(FeatureKind::Popular)?;
        with_collection(builder, collection_id)
    }

    pub fn delete(limits: TagLimits, id: &str, user_id: &str, collection_id: Option<&str>) -> Tags {
        let mut builder = base(limits, id, user_id)?;
        builder
            .add_feature(FeatureKind::Popular)?
            .add_aggregate(AggregateKind::UserStats, Some(user_id))?
            .add_aggregate(AggregateKind::GlobalStats, None)?;
        with_collection(builder, collection_id)
    }

    pub fn read(limits: TagLimits, id: &str, user_id: Option<&str>) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder.add_entity(EntityKind::Bobblehead, id)?;
        if let Some(user_id) = user_id {
            builder.add_entity(EntityKind::User, user_id)?;
        }
        Ok(builder.into_tags())
    }
}

pub mod collection {
    use super::*;
    use crate::cache::tags::{AggregateKind, FeatureKind, RelationshipKind};

    fn owned(limits: TagLimits, id: &str, user_id: &str) -> Result<CacheTagBuilder, CacheTagError> {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::Collection, id)?
            .add_entity(EntityKind::User, user_id)?
            .add_relationship(RelationshipKind::UserCollections, user_id)?;
        Ok(builder)
    }

    pub fn create(limits: TagLimits, id: &str, user_id: &str) -> Tags {
        let mut builder = owned(limits, id, user_id)?;
        builder
            .add_feature(FeatureKind::Public)?
            .add_aggregate(AggregateKind::UserStats, Some(user_id))?;
        Ok(builder.into_tags())
    }

    pub fn update(limits: TagLimits, id: &str, user_id: &str) -> Tags {
        let mut builder = owned(limits, id, user_id)?;
        builder
            .add_feature(FeatureKind::Public)?
            .add_feature(FeatureKind::Popular)?;
        Ok(builder.into_tags())
    }

    pub fn delete(limits: TagLimits, id: &str, user_id: &str) -> Tags {
        let mut builder = owned(limits, id, user_id)?;
        builder
            .add_relationship(RelationshipKind::CollectionBobbleheads, id)?
            .add_feature(FeatureKind::Public)?
            .add_feature(FeatureKind::Popular)?
            .add_aggregate(AggregateKind::UserStats, Some(user_id))?
            .add_aggregate(AggregateKind::GlobalStats, None)?;
        Ok(builder.into_tags())
    }

    pub fn read(limits: TagLimits, id: &str, user_id: Option<&str>) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder.add_entity(EntityKind::Collection, id)?;
        if let Some(user_id) = user_id {
            builder.add_entity(EntityKind::User, user_id)?;
        }
        Ok(builder.into_tags())
    }
}

pub mod featured {
    use super::*;
    use crate::cache::tags::FeatureKind;

    /// Tags for one featured-content slot, e.g. `homepage_banner`.
    pub fn content(limits: TagLimits, content_type: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_feature(FeatureKind::Featured)?
            .add_custom(format!("featured:{content_type}"))?;
        Ok(builder.into_tags())
    }

    pub fn update(limits: TagLimits) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_feature(FeatureKind::Featured)?
            .add_feature(FeatureKind::Public)?;
        Ok(builder.into_tags())
    }
}

pub mod newsletter {
    use super::*;

    /// Per-address tag so a subscription check can be invalidated alone.
    pub fn subscription(limits: TagLimits, email: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder.add_custom(format!("newsletter:subscription:{email}"))?;
        Ok(builder.into_tags())
    }
}

pub mod search {
    use super::*;
    use crate::cache::tags::FeatureKind;

    pub fn popular(limits: TagLimits) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_feature(FeatureKind::Search)?
            .add_feature(FeatureKind::Popular)?;
        Ok(builder.into_tags())
    }

    /// The query text never appears in a tag; results are invalidated per
    /// entity type.
    pub fn results(limits: TagLimits, _query: &str, entity_type: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_feature(FeatureKind::Search)?
            .add_custom(format!("search:{entity_type}"))?;
        Ok(builder.into_tags())
    }
}

pub mod social {
    use super::*;
    use crate::cache::tags::{AggregateKind, FeatureKind};

    pub fn comment(limits: TagLimits, comment_id: &str, user_id: Option<&str>) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder.add_entity(EntityKind::Comment, comment_id)?;
        if let Some(user_id) = user_id {
            builder.add_entity(EntityKind::User, user_id)?;
        }
        Ok(builder.into_tags())
    }

    /// Tags for the comment list hanging off a bobblehead or collection.
    pub fn comments(limits: TagLimits, kind: EntityKind, id: &str) -> Tags {
        ensure_supported(
            "Social comments",
            "'bobblehead' or 'collection'",
            &[EntityKind::Bobblehead, EntityKind::Collection],
            kind,
        )?;
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(kind, id)?
            .add_custom(format!("comments:{kind}:{id}"))?
            .add_feature(FeatureKind::Popular)?;
        Ok(builder.into_tags())
    }

    pub fn comment_thread(limits: TagLimits, parent_comment_id: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::Comment, parent_comment_id)?
            .add_custom(format!("comment-replies:{parent_comment_id}"))?;
        Ok(builder.into_tags())
    }

    pub fn follow(limits: TagLimits, follower_id: &str, followed_id: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::User, follower_id)?
            .add_entity(EntityKind::User, followed_id)?
            .add_aggregate(AggregateKind::UserStats, Some(follower_id))?
            .add_aggregate(AggregateKind::UserStats, Some(followed_id))?;
        Ok(builder.into_tags())
    }

    pub fn like(limits: TagLimits, kind: EntityKind, id: &str, user_id: &str) -> Tags {
        ensure_supported(
            "Social like",
            "'bobblehead', 'collection', or 'comment'",
            &[
                EntityKind::Bobblehead,
                EntityKind::Collection,
                EntityKind::Comment,
            ],
            kind,
        )?;
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(kind, id)?
            .add_entity(EntityKind::User, user_id)?
            .add_feature(FeatureKind::Popular)?
            .add_aggregate(AggregateKind::GlobalStats, None)?;
        Ok(builder.into_tags())
    }
}

pub mod user {
    use super::*;
    use crate::cache::tags::{AggregateKind, RelationshipKind};

    pub fn profile(limits: TagLimits, user_id: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder.add_entity(EntityKind::User, user_id)?;
        Ok(builder.into_tags())
    }

    pub fn stats(limits: TagLimits, user_id: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::User, user_id)?
            .add_aggregate(AggregateKind::UserStats, Some(user_id))?
            .add_aggregate(AggregateKind::GlobalStats, None)?;
        Ok(builder.into_tags())
    }

    pub fn update(limits: TagLimits, user_id: &str) -> Tags {
        let mut builder = CacheTagBuilder::with_limits(limits);
        builder
            .add_entity(EntityKind::User, user_id)?
            .add_relationship(RelationshipKind::UserBobbleheads, user_id)?
            .add_relationship(RelationshipKind::UserCollections, user_id)?
            .add_aggregate(AggregateKind::UserStats, Some(user_id))?;
        Ok(builder.into_tags())
    }
}
