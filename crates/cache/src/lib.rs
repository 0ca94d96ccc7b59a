use std::time::Duration;

use redis::{Client, Commands, Connection};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(String),

    #[error("Cache configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Redis-backed cache with a uniform TTL for every entry.
pub struct RedisCache {
    client: Client,
    ttl: Duration,
}

impl RedisCache {
    /// Open a client and verify the server is reachable.
    pub fn new(redis_url: &str, ttl: Duration) -> Result<Self> {
        if redis_url.is_empty() {
            return Err(CacheError::Configuration(
                "redis url must not be empty".to_string(),
            ));
        }

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Configuration(format!("invalid redis url: {}", e)))?;

        let _conn = client
            .get_connection()
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::debug!(ttl_secs = ttl.as_secs(), "redis cache connected");
        Ok(Self { client, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        conn.get(key)
            .map_err(|e| CacheError::Operation(format!("get {}: {}", key, e)))
    }

    /// Store a value under the configured TTL.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.set_ex::<_, _, ()>(key, value, self.ttl.as_secs())
            .map_err(|e| CacheError::Operation(format!("set {}: {}", key, e)))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(key)
            .map_err(|e| CacheError::Operation(format!("delete {}: {}", key, e)))
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        conn.exists(key)
            .map_err(|e| CacheError::Operation(format!("exists {}: {}", key, e)))
    }

    pub async fn extend_ttl(&self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.expire::<_, ()>(key, self.ttl.as_secs() as i64)
            .map_err(|e| CacheError::Operation(format!("expire {}: {}", key, e)))
    }

    /// Liveness probe used by the readiness endpoint.
    pub async fn ping(&self) -> Result<bool> {
        let mut conn = self.connection()?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| CacheError::Operation(format!("ping: {}", e)))?;
        Ok(pong == "PONG")
    }

    fn connection(&self) -> Result<Connection> {
        self.client
            .get_connection()
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_redis_url() -> String {
        std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn should_reject_empty_url() {
        let result = RedisCache::new("", Duration::from_secs(60));
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn should_reject_malformed_url() {
        let result = RedisCache::new("not-a-redis-url", Duration::from_secs(60));
        assert!(result.is_err());
    }

    #[test]
    fn should_fail_to_connect_to_unreachable_host() {
        let result = RedisCache::new("redis://invalid-host:6379", Duration::from_secs(60));
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    async fn should_round_trip_values_with_ttl() {
        // Requires a running Redis; skips otherwise
        let Ok(cache) = RedisCache::new(&test_redis_url(), Duration::from_secs(60)) else {
            println!("Skipping test - Redis not available");
            return;
        };

        let key = format!("cache-test:{}", uuid::Uuid::new_v4());

        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert!(!cache.exists(&key).await.unwrap());

        cache.set(&key, "cached value").await.unwrap();
        assert_eq!(
            cache.get(&key).await.unwrap(),
            Some("cached value".to_string())
        );
        assert!(cache.exists(&key).await.unwrap());

        cache.extend_ttl(&key).await.unwrap();

        cache.delete(&key).await.unwrap();
        assert!(!cache.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn should_ping_server() {
        let Ok(cache) = RedisCache::new(&test_redis_url(), Duration::from_secs(60)) else {
            println!("Skipping test - Redis not available");
            return;
        };

        assert!(cache.ping().await.unwrap());
    }
}
