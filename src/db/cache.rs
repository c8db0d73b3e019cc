use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;

/// Characters of the serialized user context kept in a recommendation key
pub const CONTEXT_DIGEST_LEN: usize = 50;

/// Best-effort key/value store holding opaque JSON with per-entry expiry
///
/// Implementations never surface backend failures: an unreachable store reads
/// as a miss and writes report `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, or `None` on miss, expiry or failure
    async fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` for `ttl_seconds`; `false` when the write failed
    async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> bool;

    /// Removes `key`; `false` when the delete failed
    async fn delete(&self, key: &str) -> bool;

    /// Whether a live entry exists for `key`
    async fn exists(&self, key: &str) -> bool;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Namespaced cache keys, so recommendation sets and movie lookups never collide
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations {
        city: String,
        context_digest: String,
    },
    Movie {
        title: String,
        year: String,
    },
}

impl CacheKey {
    /// Key for a full recommendation set
    ///
    /// Distinct contexts that share their first serialized characters share a key.
    pub fn recommendations(city: &str, user_context: Option<&str>) -> Self {
        CacheKey::Recommendations {
            city: city.to_string(),
            context_digest: context_digest(user_context),
        }
    }

    pub fn movie(title: &str, year: &str) -> Self {
        CacheKey::Movie {
            title: title.to_string(),
            year: year.to_string(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                city,
                context_digest,
            } => write!(f, "recommendations:{}:{}", city, context_digest),
            CacheKey::Movie { title, year } => write!(f, "movie:{}:{}", title, year),
        }
    }
}

/// First `CONTEXT_DIGEST_LEN` characters of the JSON-serialized context
pub fn context_digest(user_context: Option<&str>) -> String {
    let serialized = serde_json::to_string(&user_context).unwrap_or_default();
    serialized.chars().take(CONTEXT_DIGEST_LEN).collect()
}

/// Typed front for a [`CacheStore`]
///
/// Serialization problems are logged and treated like a miss, the same as
/// backend failures.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Retrieves and decodes the value cached under `key`
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let value = self.store.get(&key).await?;

        match serde_json::from_value(value) {
            Ok(data) => {
                tracing::debug!(cache_key = %key, backend = self.store.name(), "Cache hit");
                Some(data)
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache deserialization error");
                None
            }
        }
    }

    /// Encodes and stores `value`; returns whether the write went through
    pub async fn set_in_cache<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) -> bool {
        let key = key.to_string();
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Cache serialization error");
                return false;
            }
        };

        let stored = self.store.set(&key, value, ttl).await;
        if stored {
            tracing::debug!(cache_key = %key, ttl = ttl, "Cached value");
        } else {
            tracing::warn!(cache_key = %key, backend = self.store.name(), "Cache write failed");
        }
        stored
    }

    pub async fn remove(&self, key: &CacheKey) -> bool {
        self.store.delete(&key.to_string()).await
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.store.exists(&key.to_string()).await
    }
}
