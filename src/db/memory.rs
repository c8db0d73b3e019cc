use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::CacheStore;

/// Writes between two sweeps of expired entries
pub const SWEEP_INTERVAL: usize = 256;

struct Entry {
    value: Value,
    /// `None` when the TTL does not fit in an `Instant`
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache store for single-instance deployments and tests
///
/// Expired entries are dropped when they are next read, and every
/// [`SWEEP_INTERVAL`] writes a sweep drops the ones nobody reads again.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Entry>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(
                removed = removed,
                remaining = self.entries.len(),
                "Purged expired cache entries"
            );
        }
        removed
    }

    fn live_value(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        // The read guard must be dropped before remove_if touches the same shard.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.live_value(key)
    }

    async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> bool {
        let expires_at = Instant::now().checked_add(Duration::from_secs(ttl_seconds));
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.remove(key);
        true
    }

    async fn exists(&self, key: &str) -> bool {
        self.live_value(key).is_some()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
