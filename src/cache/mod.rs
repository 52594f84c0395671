//! Record Cache
//!
//! Key derivation plus the shared key-value store for generated records.
//! Entries are immutable once written and expire naturally; there is no
//! explicit deletion path in the request flow.

pub mod key;
pub mod memory;
pub mod sqlite;

pub use key::request_key;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheBackend, CacheConfig};
use crate::constants::cache as cache_constants;
use crate::types::{GeneratedRecord, Result};

/// Store interface used by the orchestrator: `has`/`get`/`put` with a TTL.
pub trait RecordCache: Send + Sync {
    fn get(&self, key: &str) -> Option<GeneratedRecord>;
    fn put(&self, key: &str, record: &GeneratedRecord, ttl: Duration);
    fn has(&self, key: &str) -> bool;
}

/// Shared cache handle for the orchestrator.
pub type SharedCache = Arc<dyn RecordCache>;

/// Create a cache from configuration.
pub fn create_cache(config: &CacheConfig) -> Result<SharedCache> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackend::Sqlite => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| cache_constants::DEFAULT_SQLITE_FILE.into());
            Ok(Arc::new(SqliteCache::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_is_the_default() {
        let cache = create_cache(&CacheConfig::default()).unwrap();
        assert!(!cache.has("qualquer"));
    }
}
