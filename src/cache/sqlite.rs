//! SQLite-backed Record Cache
//!
//! Persistent cache for generated records, surviving process restarts.
//! Connection pooling via r2d2 and WAL mode, with records stored as JSON and
//! an absolute expiry timestamp per row.
//!
//! Cache failures never fail the pipeline: read errors degrade to a miss and
//! write errors are logged and dropped.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::warn;

use super::RecordCache;
use crate::types::{GeneratedRecord, LicitaError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ai_cache (
    cache_key  TEXT PRIMARY KEY,
    record     TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ai_cache_expiry ON ai_cache(expires_at);
";

pub struct SqliteCache {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| LicitaError::Cache(format!("failed to open cache pool: {e}")))?;

        let conn = pool
            .get()
            .map_err(|e| LicitaError::Cache(format!("failed to acquire connection: {e}")))?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self { pool })
    }

    /// Remove expired rows. Maintenance only; reads already ignore them.
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| LicitaError::Cache(format!("failed to acquire connection: {e}")))?;
        let removed = conn.execute(
            "DELETE FROM ai_cache WHERE expires_at <= ?1",
            params![now_secs()],
        )?;
        Ok(removed)
    }

    fn try_get(&self, key: &str) -> Result<Option<GeneratedRecord>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| LicitaError::Cache(format!("failed to acquire connection: {e}")))?;

        let mut stmt =
            conn.prepare("SELECT record FROM ai_cache WHERE cache_key = ?1 AND expires_at > ?2")?;
        let mut rows = stmt.query(params![key, now_secs()])?;

        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn try_put(&self, key: &str, record: &GeneratedRecord, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let expires_at = now_secs() + ttl.as_secs() as i64;

        let conn = self
            .pool
            .get()
            .map_err(|e| LicitaError::Cache(format!("failed to acquire connection: {e}")))?;
        conn.execute(
            "INSERT OR REPLACE INTO ai_cache (cache_key, record, expires_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, expires_at],
        )?;
        Ok(())
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

impl RecordCache for SqliteCache {
    fn get(&self, key: &str) -> Option<GeneratedRecord> {
        match self.try_get(key) {
            Ok(hit) => hit,
            Err(err) => {
                warn!(error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    fn put(&self, key: &str, record: &GeneratedRecord, ttl: Duration) {
        if let Err(err) = self.try_put(key, record, ttl) {
            warn!(error = %err, "cache write failed, record not stored");
        }
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
