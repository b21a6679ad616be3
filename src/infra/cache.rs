//! Redis cache implementation.
//!
//! Holds session-scoped flash messages: short-lived notifications queued by
//! one request and read back by the next.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::{Config, CACHE_PREFIX_FLASH, FLASH_TTL_SECONDS};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Storage for flash messages, keyed by session.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FlashStore: Send + Sync {
    /// Append messages to the session queue
    async fn push(&self, session: &str, messages: Vec<String>) -> AppResult<()>;

    /// Remove and return every queued message, oldest first
    async fn pop_all(&self, session: &str) -> AppResult<Vec<String>>;

    /// Check connectivity of the store
    async fn ping(&self) -> AppResult<()>;
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
    flash_ttl: u64,
}

impl Cache {
    /// Create a new cache instance and connect to Redis.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str()).map_err(cache_error)?;
        let connection = ConnectionManager::new(client).await.map_err(cache_error)?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            connection,
            flash_ttl: FLASH_TTL_SECONDS,
        })
    }

    fn flash_key(session: &str) -> String {
        format!("{}{}", CACHE_PREFIX_FLASH, session)
    }
}

#[async_trait]
impl FlashStore for Cache {
    async fn push(&self, session: &str, messages: Vec<String>) -> AppResult<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let key = Self::flash_key(session);
        let mut conn = self.connection.clone();
        let _: () = conn.rpush(&key, messages).await.map_err(cache_error)?;
        let _: () = conn
            .expire(&key, self.flash_ttl as i64)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn pop_all(&self, session: &str) -> AppResult<Vec<String>> {
        let key = Self::flash_key(session);
        let mut conn = self.connection.clone();

        // Read and clear in one round trip so a message is shown once
        let (messages,): (Vec<String>,) = redis::pipe()
            .atomic()
            .lrange(&key, 0, -1)
            .del(&key)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(messages)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}
