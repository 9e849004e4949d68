//! Cache configuration.
//!
//! Controls the tag cache store and tag builder limits via `headshakers.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::tags::TagLimits;

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_TTL_SHORT_SECS: u64 = 300;
const DEFAULT_TTL_MEDIUM_SECS: u64 = 1800;
const DEFAULT_TTL_LONG_SECS: u64 = 3600;
const DEFAULT_TTL_EXTENDED_SECS: u64 = 86_400;

/// Named time-to-live presets used by cache call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPresets {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
    pub extended: Duration,
}

impl Default for TtlPresets {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(DEFAULT_TTL_SHORT_SECS),
            medium: Duration::from_secs(DEFAULT_TTL_MEDIUM_SECS),
            long: Duration::from_secs(DEFAULT_TTL_LONG_SECS),
            extended: Duration::from_secs(DEFAULT_TTL_EXTENDED_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false, nothing is stored and every lookup misses.
    pub enabled: bool,
    /// Maximum entries in the tag cache before LRU eviction.
    pub capacity: usize,
    pub ttl: TtlPresets,
    pub limits: TagLimits,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl: TtlPresets::default(),
            limits: TagLimits::default(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            ttl: settings.ttl,
            limits: settings.limits,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
