use redis::{Client, RedisError, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: CacheConfig,
}

impl RedisCache {
    pub async fn new(redis_url: &str, config: CacheConfig) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection, config })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a value from cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> redis::RedisResult<Option<T>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await?;

        match value {
            Some(v) => {
                let deserialized = serde_json::from_str(&v).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::TypeError,
                        "Deserialization error",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(deserialized))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with a TTL
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> redis::RedisResult<()> {
        let serialized = serde_json::to_string(value).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut self.connection.clone())
            .await
    }

    /// Delete a key from cache
    pub async fn delete(&self, key: &str) -> redis::RedisResult<()> {
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.connection.clone())
            .await
    }

    /// Delete multiple keys matching a pattern
    pub async fn delete_pattern(&self, pattern: &str) -> redis::RedisResult<()> {
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut self.connection.clone())
            .await?;

        if !keys.is_empty() {
            let _: () = redis::cmd("DEL")
                .arg(&keys)
                .query_async(&mut self.connection.clone())
                .await?;
        }

        Ok(())
    }

    /// Drop cached entries that may show a stale version of `gig_id`.
    ///
    /// Cache trouble never fails a request; it is only logged.
    pub async fn invalidate_gig(&self, gig_id: &str) {
        if let Err(e) = self.delete(&keys::gig(gig_id)).await {
            tracing::warn!("Failed to invalidate gig {gig_id} cache: {e}");
        }
        self.invalidate_gig_lists().await;
    }

    /// Drop every cached open-gig listing.
    pub async fn invalidate_gig_lists(&self) {
        if let Err(e) = self.delete_pattern(&keys::gig_list("*")).await {
            tracing::warn!("Failed to invalidate gig listings: {e}");
        }
    }
}

/// Cache key generators
pub mod keys {
    /// Generate key for open gig listings filtered by a search term
    pub fn gig_list(search: &str) -> String {
        format!("gigs:list:{}", search)
    }

    /// Generate key for single gig
    pub fn gig(id: &str) -> String {
        format!("gig:{}", id)
    }
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub gig_list_ttl: Duration,
    pub gig_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            gig_list_ttl: Duration::from_secs(300), // 5 minutes
            gig_ttl: Duration::from_secs(600),      // 10 minutes
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            gig_list_ttl: parse_duration_secs("CACHE_TTL_GIGS", 300),
            gig_ttl: parse_duration_secs("CACHE_TTL_GIG_DETAIL", 600),
        }
    }
}

fn parse_duration_secs(env_var: &str, default: u64) -> Duration {
    std::env::var(env_var)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

/// Wrapper type for Actix-web app data
pub type CacheData = Arc<RedisCache>;
