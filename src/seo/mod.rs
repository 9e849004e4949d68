//! Search-engine metadata support.

pub mod metadata_cache;

pub use metadata_cache::{
    MetadataCache, MetadataCacheMonitor, MetadataCacheStats, MetadataContentType,
};
