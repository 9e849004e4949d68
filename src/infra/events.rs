//! Loading change events from disk.

use std::path::Path;

use tracing::debug;

use crate::cache::InvalidationEvent;

use super::error::InfraError;

/// Read a JSON array of invalidation events.
pub async fn read_event_file(path: &Path) -> Result<Vec<InvalidationEvent>, InfraError> {
    let bytes = tokio::fs::read(path).await?;
    let events: Vec<InvalidationEvent> = serde_json::from_slice(&bytes)
        .map_err(|err| InfraError::event_file(path.display().to_string(), err.to_string()))?;
    debug!(path = %path.display(), count = events.len(), "Loaded invalidation events");
    Ok(events)
}
