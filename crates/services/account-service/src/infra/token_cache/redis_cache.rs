//! Redis-backed recovery token cache.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use common::{AppResult, CacheConfig};

use super::RecoveryTokenCache;

/// Recovery tokens in Redis, written with `SET key value EX ttl`.
#[derive(Clone)]
pub struct RedisTokenCache {
    connection: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisTokenCache {
    /// Connect to Redis, returning an error instead of panicking.
    ///
    /// Failures surface as `AppError::Cache` and are logged where they are
    /// rendered for the caller.
    pub async fn connect(config: &CacheConfig) -> AppResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis token cache connected");

        Ok(Self {
            connection,
            ttl_seconds: config.default_ttl_seconds,
        })
    }
}

#[async_trait]
impl RecoveryTokenCache for RedisTokenCache {
    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, self.ttl_seconds).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
