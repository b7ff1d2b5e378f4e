//! Two-tier cache for extracted records.
//!
//! A fast process-local [`MemoryTier`] sits in front of an optional
//! [`DurableStore`] that survives restarts (SQLite via [`SqliteStore`]).
//! Entries are addressed by a deterministic [`CacheKey`] and expire after a
//! TTL chosen by the caller per data category.
//!
//! The cache is an optimization only: durable failures are logged and never
//! reach the caller.

pub mod durable;
pub mod error;
mod key;
mod memory;
mod tiered;

#[cfg(any(test, feature = "mock"))]
pub use crate::durable::MemoryStore;
pub use crate::durable::{DurableStore, SqliteStore};
pub use crate::key::CacheKey;
pub use crate::memory::{MemoryStats, MemoryTier};
pub use crate::tiered::{Cache, CacheConfig, CacheStats, DEFAULT_DURABLE_TTL, DEFAULT_EPHEMERAL_TTL};
