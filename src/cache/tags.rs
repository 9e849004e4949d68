//! Cache tag vocabulary.
//!
//! Defines the typed kinds a tag can describe and the string templates they
//! render to. Tags are opaque strings once built; these types only exist so
//! call sites cannot misspell a template.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of tags a single builder may accumulate.
pub const MAX_TAGS_PER_BUILDER: usize = 50;
/// Maximum length of a single tag, in characters.
pub const MAX_TAG_LENGTH: usize = 100;

/// Size limits enforced by [`CacheTagBuilder`](super::CacheTagBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLimits {
    pub max_tags: usize,
    pub max_tag_length: usize,
}

impl TagLimits {
    pub const DEFAULT: TagLimits = TagLimits {
        max_tags: MAX_TAGS_PER_BUILDER,
        max_tag_length: MAX_TAG_LENGTH,
    };
}

impl Default for TagLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A single domain object that cached values can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Bobblehead,
    Collection,
    Comment,
    Tag,
    User,
}

/// One-to-many associations whose membership can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    BobbleheadTags,
    CollectionBobbleheads,
    UserBobbleheads,
    UserCollections,
}

/// Cross-cutting content buckets spanning many entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    Featured,
    Popular,
    Public,
    Search,
}

/// Computed rollups fed by many entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateKind {
    GlobalStats,
    Trending,
    UserStats,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Bobblehead,
        EntityKind::Collection,
        EntityKind::Comment,
        EntityKind::Tag,
        EntityKind::User,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Bobblehead => "bobblehead",
            EntityKind::Collection => "collection",
            EntityKind::Comment => "comment",
            EntityKind::Tag => "tag",
            EntityKind::User => "user",
        }
    }

    /// Render the entity tag for `id`.
    pub fn tag(self, id: &str) -> String {
        format!("{}:{id}", self.as_str())
    }
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 4] = [
        RelationshipKind::BobbleheadTags,
        RelationshipKind::CollectionBobbleheads,
        RelationshipKind::UserBobbleheads,
        RelationshipKind::UserCollections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::BobbleheadTags => "bobblehead-tags",
            RelationshipKind::CollectionBobbleheads => "collection-bobbleheads",
            RelationshipKind::UserBobbleheads => "user-bobbleheads",
            RelationshipKind::UserCollections => "user-collections",
        }
    }

    /// Render the relationship tag owned by `id`.
    pub fn tag(self, id: &str) -> String {
        format!("{}:{id}", self.as_str())
    }
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Featured,
        FeatureKind::Popular,
        FeatureKind::Public,
        FeatureKind::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Featured => "featured",
            FeatureKind::Popular => "popular",
            FeatureKind::Public => "public",
            FeatureKind::Search => "search",
        }
    }

    pub fn tag(self) -> String {
        self.as_str().to_string()
    }
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 3] = [
        AggregateKind::GlobalStats,
        AggregateKind::Trending,
        AggregateKind::UserStats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AggregateKind::GlobalStats => "global-stats",
            AggregateKind::Trending => "trending",
            AggregateKind::UserStats => "user-stats",
        }
    }

    /// Render the aggregate tag.
    ///
    /// Site-wide aggregates ignore `id`. Per-user stats need one and yield
    /// `None` without it.
    pub fn tag(self, id: Option<&str>) -> Option<String> {
        match self {
            AggregateKind::GlobalStats | AggregateKind::Trending => Some(self.as_str().to_string()),
            AggregateKind::UserStats => id.map(|id| format!("{}:{id}", self.as_str())),
        }
    }
}

macro_rules! impl_kind_traits {
    ($kind:ident, $label:literal) => {
        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $kind {
            type Err = UnknownKind;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $kind::ALL
                    .into_iter()
                    .find(|kind| kind.as_str() == value)
                    .ok_or_else(|| UnknownKind {
                        kind: $label,
                        value: value.to_string(),
                    })
            }
        }
    };
}

impl_kind_traits!(EntityKind, "entity");
impl_kind_traits!(RelationshipKind, "relationship");
impl_kind_traits!(FeatureKind, "feature");
impl_kind_traits!(AggregateKind, "aggregate");

/// Returned when parsing a kind name that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} kind `{value}`")]
pub struct UnknownKind {
    pub kind: &'static str,
    pub value: String,
}

/// Raw tag templates, for call sites that invalidate a single tag directly.
pub mod names {
    use super::{AggregateKind, EntityKind, RelationshipKind};

    pub fn bobblehead(id: &str) -> String {
        EntityKind::Bobblehead.tag(id)
    }

    pub fn collection(id: &str) -> String {
        EntityKind::Collection.tag(id)
    }

    pub fn comment(id: &str) -> String {
        EntityKind::Comment.tag(id)
    }

    pub fn tag(id: &str) -> String {
        EntityKind::Tag.tag(id)
    }

    pub fn user(id: &str) -> String {
        EntityKind::User.tag(id)
    }

    pub fn bobblehead_tags(id: &str) -> String {
        RelationshipKind::BobbleheadTags.tag(id)
    }

    pub fn collection_bobbleheads(id: &str) -> String {
        RelationshipKind::CollectionBobbleheads.tag(id)
    }

    pub fn user_bobbleheads(id: &str) -> String {
        RelationshipKind::UserBobbleheads.tag(id)
    }

    pub fn user_collections(id: &str) -> String {
        RelationshipKind::UserCollections.tag(id)
    }

    pub fn user_stats(id: &str) -> String {
        format!("{}:{id}", AggregateKind::UserStats.as_str())
    }

    pub const FEATURED: &str = "featured";
    pub const POPULAR: &str = "popular";
    pub const PUBLIC: &str = "public";
    pub const SEARCH: &str = "search";
    pub const GLOBAL_STATS: &str = "global-stats";
    pub const TRENDING: &str = "trending";
}
