//! Head Shakers cache tags.
//!
//! Two halves:
//!
//! - **Tag computation** (`tags`, `builder`, `generators`, `invalidation`):
//!   pure, synchronous functions deciding which tags a cached value depends
//!   on and which tags a domain change must invalidate.
//! - **Tag cache** (`store`, `registry`): an in-process store that attaches
//!   those tags to entries and evicts by tag.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1000
//! max_tags = 50
//! max_tag_length = 100
//! ttl_long_seconds = 3600
//! # ... see config.rs for all options
//! ```

mod builder;
mod config;
mod error;
pub mod generators;
pub mod invalidation;
mod lock;
mod registry;
mod store;
pub mod tags;

pub use builder::{CacheTagBuilder, validate_tag};
pub use config::{CacheConfig, TtlPresets};
pub use error::CacheTagError;
pub use invalidation::InvalidationEvent;
pub use registry::TagRegistry;
pub use store::{CacheLookup, TagCache};
pub use tags::{
    AggregateKind, EntityKind, FeatureKind, MAX_TAG_LENGTH, MAX_TAGS_PER_BUILDER,
    RelationshipKind, TagLimits,
};
