//! Per-session conversation state and message-id deduplication.
//!
//! Both caches are collaborator contracts ([`SessionCache`], [`DedupCache`])
//! with in-memory `DashMap` implementations that are safe to share across
//! concurrently handled events.

pub mod dedup;
pub mod error;
pub mod memory;

pub use {
    dedup::{DedupCache, MemoryDedupCache},
    error::{Error, Result},
    memory::{MemorySessionCache, SessionCache, SessionPolicy},
};
