use thiserror::Error;

use crate::{cache::CacheTagError, config::LoadError, infra::error::InfraError};

/// Top-level error for the headshakers binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("cannot compute tags for `{event}`: {source}")]
    Tags {
        event: &'static str,
        #[source]
        source: CacheTagError,
    },
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    pub fn tags(event: &'static str, source: CacheTagError) -> Self {
        Self::Tags { event, source }
    }
}
