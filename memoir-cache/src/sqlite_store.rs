//! Embedded SQLite backend.
//!
//! One table keyed by `(cache_key, args_key)` holds every entry, with an
//! index on `cache_key` for the family-cleanup scan. Values are stored as
//! JSON text next to a creation timestamp. The schema is created
//! idempotently inside the constructor, so callers never observe a
//! not-yet-initialized store.
//!
//! The connection lives behind a mutex guarding single statements only;
//! there is no atomicity across a read-modify-write cycle (two concurrent
//! misses on one key may both compute and both write, last write wins).

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use memoir_core::{family_prefix, CacheError, CacheResult, DELIMITER, EMPTY_ARGS_KEY};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::store::CacheStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_key  TEXT NOT NULL,
    args_key   TEXT NOT NULL,
    value      TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (cache_key, args_key)
);
CREATE INDEX IF NOT EXISTS idx_cache_key ON cache_entries(cache_key);
";

/// Cache store backed by a single-table SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let conn = Connection::open(path).map_err(|e| CacheError::database("open", e))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database, useful for tests.
    pub fn in_memory() -> CacheResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::database("open", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| CacheError::database("init schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn get_raw(&self, key: &str, args_key: &str) -> CacheResult<Option<serde_json::Value>> {
        let conn = self.lock()?;
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE cache_key = ?1 AND args_key = ?2",
                params![key, args_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CacheError::database("get", e))?;

        match text {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(key, error = %e, "corrupt cache row; treating as miss");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn put_raw(
        &self,
        key: &str,
        args_key: &str,
        value: serde_json::Value,
    ) -> CacheResult<()> {
        let text = serde_json::to_string(&value)?;
        let conn = self.lock()?;
        let written = conn.execute(
            "INSERT OR REPLACE INTO cache_entries (cache_key, args_key, value, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, args_key, text, chrono::Utc::now().timestamp_millis()],
        );
        if let Err(e) = written {
            warn!(key, error = %e, "error writing cache; result not persisted");
        }
        Ok(())
    }

    async fn has(&self, key: &str) -> CacheResult<bool> {
        let conn = self.lock()?;
        let row: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM cache_entries WHERE cache_key = ?1 AND args_key = ?2",
                params![key, EMPTY_ARGS_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CacheError::database("has", e))?;
        Ok(row.is_some())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM cache_entries WHERE cache_key = ?1",
            params![key],
        )
        .map_err(|e| CacheError::database("delete", e))?;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cache_entries", [])
            .map_err(|e| CacheError::database("clear", e))?;
        Ok(())
    }

    async fn remove_family(&self, new_key: &str) -> CacheResult<u64> {
        let prefix = family_prefix(new_key);
        if prefix.is_empty() {
            return Ok(0);
        }
        let conn = self.lock()?;
        let purged = conn
            .execute(
                "DELETE FROM cache_entries
                 WHERE cache_key LIKE ?1 || ?2 || '%' AND cache_key != ?3",
                params![prefix, DELIMITER.to_string(), new_key],
            )
            .map_err(|e| CacheError::database("remove family", e))?;
        if purged > 0 {
            debug!(prefix, purged, "cleaned up old cache versions");
        }
        Ok(purged as u64)
    }

    fn direct_scope(&self) -> &'static str {
        EMPTY_ARGS_KEY
    }
}
