use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::durable::DurableStore;
use crate::key::CacheKey;
use crate::memory::{MemoryStats, MemoryTier};

pub const DEFAULT_EPHEMERAL_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_DURABLE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL given to values promoted from the durable tier.
    pub ephemeral_ttl: Duration,
    /// TTL of every durable write, regardless of the TTL passed to [`Cache::set`].
    pub durable_ttl: Duration,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ephemeral_ttl: DEFAULT_EPHEMERAL_TTL,
            durable_ttl: DEFAULT_DURABLE_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory: MemoryStats,
    /// Name of the durable store, if one is attached.
    pub durable: Option<String>,
}

/// Read-through, write-through two-tier cache.
///
/// Lookups consult the ephemeral tier first and fall back to the optional
/// durable tier, promoting durable hits. Writes go to both tiers. Durable
/// failures are logged and otherwise ignored: the cache then behaves as if
/// only the ephemeral tier existed. Values are stored as JSON; a stored value
/// that no longer deserializes into the requested type reads as a miss.
#[derive(Debug)]
pub struct Cache {
    memory: MemoryTier,
    durable: Option<Arc<dyn DurableStore>>,
    config: CacheConfig,
}

impl Cache {
    /// An ephemeral-only cache.
    pub fn new(config: CacheConfig) -> Self {
        Self { memory: MemoryTier::new(), durable: None, config }
    }

    pub fn with_durable(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[tracing::instrument(level = "trace", skip_all, fields(key = %key))]
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        if let Some(raw) = self.memory.get(&key) {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, tier = "memory", "Cache hit");
                    return Some(value);
                },
                Err(err) => {
                    tracing::warn!(key, error = %err, "Discarding undecodable cache entry");
                    self.memory.delete(&key);
                },
            }
        }
        let durable = self.durable.as_ref()?;
        let raw = match durable.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key, "Cache miss");
                return None;
            },
            Err(err) => {
                let kind: &crate::error::ErrorKind = &err;
                tracing::warn!(key, store = durable.name(), error = %kind, "Durable cache read failed");
                return None;
            },
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, tier = durable.name(), "Cache hit, promoting");
                self.memory.set(&key, raw, self.config.ephemeral_ttl);
                Some(value)
            },
            Err(err) => {
                tracing::warn!(key, store = durable.name(), error = %err, "Ignoring undecodable durable cache entry");
                None
            },
        }
    }

    /// Stores `value` for `ttl` in the ephemeral tier and for the configured
    /// durable TTL in the durable tier.
    #[tracing::instrument(level = "trace", skip_all, fields(key = %key))]
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let key = key.to_string();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "Value could not be serialized, not caching");
                return;
            },
        };
        if let Some(durable) = &self.durable
            && let Err(err) = durable.set(&key, &raw, self.config.durable_ttl).await
        {
            let kind: &crate::error::ErrorKind = &err;
            tracing::warn!(key, store = durable.name(), error = %kind, "Durable cache write failed");
        }
        self.memory.set(&key, raw, ttl);
    }

    pub async fn delete(&self, key: &CacheKey) {
        let key = key.to_string();
        self.memory.delete(&key);
        if let Some(durable) = &self.durable
            && let Err(err) = durable.delete(&key).await
        {
            let kind: &crate::error::ErrorKind = &err;
            tracing::warn!(key, store = durable.name(), error = %kind, "Durable cache delete failed");
        }
    }

    pub async fn clear(&self) {
        self.memory.clear();
        if let Some(durable) = &self.durable
            && let Err(err) = durable.clear().await
        {
            let kind: &crate::error::ErrorKind = &err;
            tracing::warn!(store = durable.name(), error = %kind, "Durable cache clear failed");
        }
    }

    /// Drops expired ephemeral entries.
    pub fn purge_expired(&self) -> usize {
        self.memory.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory: self.memory.stats(),
            durable: self.durable.as_ref().map(|durable| durable.name().to_string()),
        }
    }
}
impl Default for Cache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
