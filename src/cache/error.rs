use thiserror::Error;

use super::tags::EntityKind;

/// Failures while composing a tag set.
///
/// These are programming errors at the call site, never transient; callers
/// should not retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheTagError {
    #[error("{what} ID must be a non-empty string")]
    EmptyId { what: &'static str },
    #[error("Cache tag must be a non-empty string")]
    EmptyTag,
    #[error("Cache tag length exceeds maximum: {length} > {max}")]
    TagTooLong { length: usize, max: usize },
    #[error(
        "Cache tag limit exceeded: {count} >= {max}. Consider using fewer tags or calling build() and reset() more frequently."
    )]
    TagLimitExceeded { count: usize, max: usize },
    #[error("{operation} only supports {supported} entities, got: {got}")]
    UnsupportedEntity {
        operation: &'static str,
        supported: &'static str,
        got: EntityKind,
    },
}

impl CacheTagError {
    pub fn unsupported(operation: &'static str, supported: &'static str, got: EntityKind) -> Self {
        Self::UnsupportedEntity {
            operation,
            supported,
            got,
        }
    }
}
