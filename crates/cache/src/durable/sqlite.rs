//! SQLite-backed durable tier.

use async_trait::async_trait;
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

use super::{DurableStore, expiry_millis, now_millis};
use crate::error::{ErrorKind, Result};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// Entries are single-row lookups by primary key; a few readers are plenty.
const FILE_CONNECTIONS: u32 = 4;

/// Durable tier stored in one `cache_entries` table, values as JSON text.
///
/// Expired rows read as misses; they are physically removed by
/// [`SqliteStore::purge_expired`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the cache file at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Opening durable cache");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // Several `scanline` processes may share one cache file.
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(2));
        Self::open(options, FILE_CONNECTIONS).await
    }

    /// A private store that disappears with the pool.
    pub async fn connect_in_memory() -> Result<Self> {
        // Each connection to `:memory:` is a separate database.
        Self::open(SqliteConnectOptions::new().filename(":memory:"), 1).await
    }

    async fn open(options: SqliteConnectOptions, connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        Ok(Self { pool })
    }

    /// Deletes every expired row, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query(include_str!("../../queries/purge_expired.sql"))
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(include_str!("../../queries/get_entry.sql"))
            .bind(key)
            .bind(now_millis())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        sqlx::query(include_str!("../../queries/upsert_entry.sql"))
            .bind(key)
            .bind(value)
            .bind(expiry_millis(ttl))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query(include_str!("../../queries/delete_entry.sql"))
            .bind(key)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM cache_entries").execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
