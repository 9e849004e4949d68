//! Runtime bootstrap and file adapters.

pub mod error;
pub mod events;
pub mod telemetry;
