use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use serde_json::Value;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::db::cache::CacheStore;

/// Creates a Redis client for caching
///
/// Opening the client only parses the URL; no connection is made until the
/// first command.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed [`CacheStore`]
///
/// Holds one multiplexed connection, opened lazily. Each attempt (connect plus
/// command) is bounded by `timeout`, and an elapsed attempt counts as a broken
/// connection. A command that fails on a broken connection drops it and is
/// retried once on a fresh one; any further failure is logged and reported as a
/// miss or a failed write.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
    timeout: Duration,
}

impl RedisCache {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            timeout,
        }
    }

    /// Opens the shared connection if needed; safe to call repeatedly
    pub async fn connect(&self) -> bool {
        match self.bounded(self.connection()).await {
            Ok(_) => {
                tracing::info!("Redis client connected");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis");
                false
            }
        }
    }

    /// Whether a connection is currently held
    pub async fn is_ready(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        if let Some(conn) = self.connection.lock().await.as_ref() {
            return Ok(conn.clone());
        }

        // The lock is not held across the connect.
        let conn = self.client.get_multiplexed_async_connection().await?;

        let mut guard = self.connection.lock().await;
        match guard.as_ref() {
            Some(existing) => Ok(existing.clone()),
            None => {
                *guard = Some(conn.clone());
                Ok(conn)
            }
        }
    }

    async fn reset(&self) {
        *self.connection.lock().await = None;
    }

    /// Fails with a timed-out I/O error once `self.timeout` has elapsed
    async fn bounded<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> RedisResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RedisError::from(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer from Redis within {:?}", self.timeout),
            ))),
        }
    }

    async fn attempt<T, F, Fut>(&self, op: &F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        self.bounded(async {
            let conn = self.connection().await?;
            op(conn).await
        })
        .await
    }

    /// Runs `op`, reconnecting and retrying exactly once on a connection failure
    async fn run<T, F, Fut>(&self, op: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        match self.attempt(&op).await {
            Err(e) if is_connection_error(&e) => {
                tracing::warn!(error = %e, "Redis connection lost, reconnecting");
                self.reset().await;
                self.attempt(&op).await
            }
            other => other,
        }
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let cached: RedisResult<Option<String>> = self
            .run(|mut conn| {
                let key = key.to_string();
                async move { conn.get(key).await }
            })
            .await;

        match cached {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Corrupt Redis cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Redis get failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> bool {
        let json = value.to_string();
        let result: RedisResult<()> = self
            .run(|mut conn| {
                let key = key.to_string();
                let json = json.clone();
                async move { conn.set_ex(key, json, ttl_seconds).await }
            })
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Redis set failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let result: RedisResult<()> = self
            .run(|mut conn| {
                let key = key.to_string();
                async move { conn.del(key).await }
            })
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Redis delete failed");
                false
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let result: RedisResult<bool> = self
            .run(|mut conn| {
                let key = key.to_string();
                async move { conn.exists(key).await }
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::warn!(cache_key = %key, error = %e, "Redis exists failed");
            false
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
