//! Durable tier: a shared store that outlives the process.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod sqlite;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MemoryStore;
pub use self::sqlite::SqliteStore;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Key-value store with per-entry expiry, holding serialized values.
///
/// Entries past their TTL must read as misses. Implementations are shared by
/// every source, so all methods take `&self`.
#[async_trait]
pub trait DurableStore: Debug + Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, replacing any previous entry for `key`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

/// Milliseconds since the Unix epoch, the expiry unit of durable entries.
pub(crate) fn now_millis() -> i64 {
    (time::UtcDateTime::now().unix_timestamp_nanos() / 1_000_000) as i64
}

pub(crate) fn expiry_millis(ttl: Duration) -> i64 {
    now_millis().saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}
