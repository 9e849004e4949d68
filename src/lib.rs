//! Cache tag computation and tag-indexed caching for Head Shakers.

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod infra;
pub mod seo;
