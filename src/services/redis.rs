//! Redis integration service implementation
//!
//! This service handles the Redis connection and JSON caching of computed
//! dashboard statistics.

use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::settings::RedisConfig;
use crate::utils::errors::Result;

/// Redis service for caching
#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    config: RedisConfig,
}

/// Cache entry with TTL information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub ttl_seconds: u64,
}

impl RedisService {
    /// Create a new RedisService instance
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self { client, config })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    /// Set a value in Redis with TTL
    pub async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize,
    {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ttl = ttl_seconds.unwrap_or(self.config.ttl_seconds);
        let entry = CacheEntry {
            data: value,
            created_at: chrono::Utc::now(),
            ttl_seconds: ttl,
        };
        let serialized = serde_json::to_string(&entry)?;
        let full_key = self.full_key(key);

        let _: () = conn.set_ex(&full_key, serialized, ttl).await?;

        debug!(key = %full_key, ttl = ttl, "Value set in Redis");
        Ok(())
    }

    /// Get a value from Redis
    pub async fn get<T>(&self, key: &str) -> Result<Option<CacheEntry<T>>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let full_key = self.full_key(key);

        let result: Option<String> = conn.get(&full_key).await?;
        match result {
            Some(data) => {
                debug!(key = %full_key, "Value retrieved from Redis");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => {
                debug!(key = %full_key, "Key not found in Redis");
                Ok(None)
            }
        }
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let full_key = self.full_key(key);

        let deleted: i32 = conn.del(&full_key).await?;

        debug!(key = %full_key, deleted = deleted > 0, "Key deletion attempted");
        Ok(deleted > 0)
    }

    /// Health check
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_service_prefixes_keys() {
        let config = RedisConfig {
            url: "redis://localhost:6379".to_string(),
            prefix: "idmc:".to_string(),
            ttl_seconds: 60,
        };
        let service = RedisService::new(config).unwrap();
        assert_eq!(service.full_key("stats:dashboard"), "idmc:stats:dashboard");
    }

    #[test]
    fn test_cache_entry_serialization() {
        let entry = CacheEntry {
            data: serde_json::json!({"confirmed": 3}),
            created_at: chrono::Utc::now(),
            ttl_seconds: 60,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data["confirmed"], 3);
        assert_eq!(back.ttl_seconds, 60);
    }
}
