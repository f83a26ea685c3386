use crate::error::Result;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Prefix the host's session backend puts in front of session keys.
    pub session_key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            session_key_prefix: "session:".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            session_key_prefix: std::env::var("SESSION_KEY_PREFIX")
                .unwrap_or(defaults.session_key_prefix),
        }
    }
}

#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
}

impl Cache {
    pub async fn new(config: &CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let manager = ConnectionManager::new(client).await?;
        tracing::debug!("Redis connection manager ready");

        Ok(Self { manager })
    }

    /// Store a placeholder entry, standing in for the host starting a session.
    #[cfg(test)]
    pub(crate) async fn seed(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, "{}", ttl_seconds).await?;
        Ok(())
    }

    /// Delete a key from the cache
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Check if a key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.manager.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

pub fn session_cache_key(prefix: &str, session_key: &str) -> String {
    format!("{}{}", prefix, session_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cache_key() {
        assert_eq!(session_cache_key("session:", "sk-abc"), "session:sk-abc");
        assert_eq!(session_cache_key("", "sk-abc"), "sk-abc");
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_redis_connection() {
        let config = CacheConfig::from_env();
        let cache = Cache::new(&config).await.expect("Failed to connect to Redis");
        cache.ping().await.expect("Failed to ping Redis");
    }

    #[tokio::test]
    #[ignore]
    async fn test_exists_delete() {
        let config = CacheConfig::from_env();
        let cache = Cache::new(&config).await.unwrap();

        cache.seed("test_key", 60).await.unwrap();
        assert!(cache.exists("test_key").await.unwrap());

        cache.delete("test_key").await.unwrap();
        assert!(!cache.exists("test_key").await.unwrap());
    }
}
