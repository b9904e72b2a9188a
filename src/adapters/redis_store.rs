//! Redis-backed seen-set.
//!
//! Every membership check is a single `SADD`, so atomicity comes from Redis
//! itself. The multiplexed connection is opened on first use and discarded
//! after any failure; the next call opens a fresh one.

use crate::domain::ports::SeenStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::Mutex;

pub const DEFAULT_REDIS_KEY: &str = "repliedTo";

pub struct RedisSeenStore {
    client: redis::Client,
    key: String,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisSeenStore {
    /// Parses the URL; does not connect yet.
    pub fn open(redis_url: impl AsRef<str>, key: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url.as_ref())?;
        Ok(Self {
            client,
            key: key.into(),
            connection: Mutex::new(None),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        tracing::debug!("Opening Redis connection");
        let conn = self.client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_connection(&self) {
        *self.connection.lock().await = None;
    }
}

#[async_trait]
impl SeenStore for RedisSeenStore {
    async fn add(&self, member: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let added: std::result::Result<i64, redis::RedisError> =
            conn.sadd(&self.key, member).await;

        match added {
            Ok(count) => Ok(count == 1),
            Err(e) => {
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    #[test]
    fn test_open_rejects_invalid_url() {
        let result = RedisSeenStore::open("not a redis url", DEFAULT_REDIS_KEY);
        assert!(matches!(result, Err(AppError::StoreError(_))));
    }

    #[test]
    fn test_open_keeps_key() {
        let store = RedisSeenStore::open("redis://127.0.0.1:6379/", "customKey").unwrap();
        assert_eq!(store.key(), "customKey");
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_an_error() {
        // port 1 上不會有 Redis
        let store = RedisSeenStore::open("redis://127.0.0.1:1/", DEFAULT_REDIS_KEY).unwrap();
        assert!(store.add("12345").await.is_err());
        assert!(store.add("12345").await.is_err());
    }
}
