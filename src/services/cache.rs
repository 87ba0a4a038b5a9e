//! Chat reply cache.
//!
//! Replies are cached as JSON strings under a caller-built key with a time-to-live.
//! Redis is used when configured; otherwise an in-process map keeps the same contract
//! for single-instance deployments and tests.

use crate::errors::Result;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::{
    collections::HashMap,
    ops::Deref,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

/// Key-value cache with expiry.
#[async_trait]
pub trait ReplyCache: Send + Sync + 'static {
    /// Returns the cached value for `key` if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Shared cache handle.
///
/// This is trivially cloneable and can be stored in the application state.
#[derive(Clone)]
pub struct CacheHandle {
    inner: Arc<dyn ReplyCache>,
}

impl CacheHandle {
    /// Wraps a cache implementation.
    pub fn new(cache: impl ReplyCache) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    /// Connects to Redis at `redis_url`, or falls back to an in-process cache.
    ///
    /// # Errors
    /// Returns `Error::Cache` if the Redis URL is invalid or the server is unreachable.
    pub async fn from_url(redis_url: Option<&str>) -> Result<Self> {
        match redis_url {
            Some(url) => Ok(Self::new(RedisReplyCache::connect(url).await?)),
            None => {
                info!("No Redis URL configured, using in-process chat cache");
                Ok(Self::new(MemoryReplyCache::default()))
            }
        }
    }
}

impl Deref for CacheHandle {
    type Target = dyn ReplyCache;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

/// Redis-backed cache.
pub struct RedisReplyCache {
    connection: ConnectionManager,
}

impl RedisReplyCache {
    /// Opens a managed connection to Redis.
    ///
    /// # Errors
    /// Returns `Error::Cache` if the connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        info!("Connected to Redis chat cache");
        Ok(Self { connection })
    }
}

#[async_trait]
impl ReplyCache for RedisReplyCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await?;
        trace!("Redis lookup {key}: hit={}", value.is_some());
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }
}

/// In-process cache; expired entries are dropped lazily on read and on write.
#[derive(Default)]
pub struct MemoryReplyCache {
    entries: RwLock<HashMap<String, (Instant, String)>>,
}

#[async_trait]
impl ReplyCache for MemoryReplyCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((expires_at, value)) if *expires_at > now => return Ok(Some(value.clone())),
                None => return Ok(None),
                Some(_) => {}
            }
        }
        self.entries.write().await.remove(key);
        debug!("Evicted expired cache entry {key}");
        Ok(None)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (expires_at, _)| *expires_at > now);
        entries.insert(key.to_string(), (now + ttl, value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() -> Result<()> {
        let cache = CacheHandle::new(MemoryReplyCache::default());
        assert!(cache.get("chat:greeting:hi").await?.is_none());

        cache.put("chat:greeting:hi", "{\"reply\":\"hello\"}", Duration::from_secs(60)).await?;
        assert_eq!(
            cache.get("chat:greeting:hi").await?.as_deref(),
            Some("{\"reply\":\"hello\"}")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_cache_expires() -> Result<()> {
        let cache = MemoryReplyCache::default();
        cache.put("key", "value", Duration::from_millis(10)).await?;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("key").await?.is_none());
        assert!(cache.entries.read().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_from_url_without_redis_uses_memory() -> Result<()> {
        let cache = CacheHandle::from_url(None).await?;
        cache.put("k", "v", Duration::from_secs(5)).await?;
        assert_eq!(cache.get("k").await?.as_deref(), Some("v"));
        Ok(())
    }
}
