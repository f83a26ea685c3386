//! The host application's session store, as far as this crate needs it.
//!
//! Session records are only ever observed and removed here; the host creates
//! the entries when it starts a session.

use crate::error::Result;
use crate::redis_cache::{session_cache_key, Cache};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether the store holds an entry for `session_key`
    async fn exists(&self, session_key: &str) -> Result<bool>;

    /// Remove the entry for `session_key`
    async fn delete(&self, session_key: &str) -> Result<()>;
}

/// Session store backed by Redis keys of the form `<prefix><session_key>`.
#[derive(Clone)]
pub struct RedisSessionStore {
    cache: Cache,
    key_prefix: String,
}

impl RedisSessionStore {
    pub fn new(cache: Cache, key_prefix: impl Into<String>) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, session_key: &str) -> String {
        session_cache_key(&self.key_prefix, session_key)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn exists(&self, session_key: &str) -> Result<bool> {
        self.cache.exists(&self.key(session_key)).await
    }

    async fn delete(&self, session_key: &str) -> Result<()> {
        let key = self.key(session_key);
        self.cache.delete(&key).await?;
        tracing::debug!(key = %key, "Removed session store entry");
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    keys: Arc<RwLock<HashSet<String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stand in for the host starting a session.
    pub async fn insert(&self, session_key: impl Into<String>) {
        self.keys.write().await.insert(session_key.into());
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn exists(&self, session_key: &str) -> Result<bool> {
        Ok(self.keys.read().await.contains(session_key))
    }

    async fn delete(&self, session_key: &str) -> Result<()> {
        self.keys.write().await.remove(session_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis_cache::CacheConfig;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(!store.exists("sk-abc").await.unwrap());

        store.insert("sk-abc").await;
        assert!(store.exists("sk-abc").await.unwrap());

        store.delete("sk-abc").await.unwrap();
        assert!(!store.exists("sk-abc").await.unwrap());

        // Deleting a missing key is fine
        store.delete("sk-abc").await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_redis_store_uses_prefix() {
        let config = CacheConfig::from_env();
        let cache = Cache::new(&config).await.unwrap();
        let store = RedisSessionStore::new(cache.clone(), "safety-test:");

        cache.seed("safety-test:sk-abc", 60).await.unwrap();
        assert!(store.exists("sk-abc").await.unwrap());

        store.delete("sk-abc").await.unwrap();
        assert!(!store.exists("sk-abc").await.unwrap());
        assert!(!cache.exists("safety-test:sk-abc").await.unwrap());
    }
}
