//! In-memory durable tier for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::{DurableStore, expiry_millis, now_millis};
use crate::error::{ErrorKind, Result};

/// In-memory [`DurableStore`] for testing.
///
/// Entries live in a `HashMap` behind a [`RwLock`]. The store can be switched
/// into a failing mode to simulate an outage of the durable tier.
///
/// ```
/// use scanline_cache::{DurableStore, MemoryStore};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::with_entries([("key", "\"value\"")]);
/// assert_eq!(store.get("key").await?.as_deref(), Some("\"value\""));
/// store.set_failing(true);
/// assert!(store.get("key").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (i64, String)>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries that never expire.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries.into_iter().map(|(key, value)| (key.to_string(), (i64::MAX, value.to_string()))).collect();
        Self { entries: RwLock::new(entries), ..Self::default() }
    }

    /// While failing, every operation returns [`ErrorKind::Database`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get` calls served so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Database);
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|(expires_at, _)| *expires_at > now_millis()).map(|(_, value)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        self.entries.write().await.insert(key.to_string(), (expiry_millis(ttl), value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check()?;
        self.entries.write().await.clear();
        Ok(())
    }
}
