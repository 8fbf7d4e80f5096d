use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::Op;
use std::time::Duration;

use crate::error::CacheError;
use crate::store::Store;
use crate::utils::{expires_at, now_ms};

/// Configuration for MokaStore.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,

    /// Time to idle: entries are expired if not accessed within this duration,
    /// in addition to their own TTL.
    /// `None` means entries don't expire based on idle time.
    pub time_to_idle: Option<Duration>,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        MokaStoreConfig {
            max_capacity: 10_000,
            time_to_idle: None,
        }
    }
}

#[derive(Clone)]
struct Slot {
    expires: i64,
    payload: String,
}

/// High-performance concurrent in-process store using Moka.
///
/// Capacity-based eviction is handled by Moka; per-entry TTLs are tracked
/// alongside each payload and checked on read.
pub struct MokaStore {
    cache: Cache<String, Slot>,
}

impl MokaStore {
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store = MokaStore::new(MokaStoreConfig {
    ///     max_capacity: 50_000,
    ///     time_to_idle: Some(Duration::from_secs(600)),
    /// });
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        MokaStore {
            cache: builder.build(),
        }
    }

    /// Remove `key` only if the entry held at removal time is expired at
    /// `now`, so a concurrent `set_ex` is not lost.
    async fn invalidate_expired(&self, key: &str, now: i64) {
        self.cache
            .entry_by_ref(key)
            .and_compute_with(|entry| {
                let op = match entry {
                    Some(entry) if now >= entry.value().expires => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }

    /// Get cache statistics (for monitoring/debugging).
    pub fn stats(&self) -> (u64, u64) {
        let entry_count = self.cache.entry_count();
        let weighted_size = self.cache.weighted_size();
        (entry_count, weighted_size)
    }
}

#[async_trait]
impl Store for MokaStore {
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.cache.get(key).await {
            Some(slot) => {
                let now = now_ms();
                if now >= slot.expires {
                    self.invalidate_expired(key, now).await;
                    return Ok(None);
                }

                Ok(Some(slot.payload))
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let slot = Slot {
            expires: expires_at(ttl_secs),
            payload: value,
        };
        self.cache.insert(key.to_string(), slot).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MokaStore::new(MokaStoreConfig::default());

        let result = store.get("key1").await.unwrap();
        assert!(result.is_none());

        store.set_ex("key1", "value1".to_string(), 60).await.unwrap();

        let result = store.get("key1").await.unwrap();
        assert_eq!(result.as_deref(), Some("value1"));

        store.delete("key1").await.unwrap();

        let result = store.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_removed() {
        let store = MokaStore::new(MokaStoreConfig::default());

        // Insert a slot that's already expired
        let slot = Slot {
            expires: now_ms() - 500,
            payload: "value1".to_string(),
        };
        store.cache.insert("expired_key".to_string(), slot).await;

        let result = store.get("expired_key").await.unwrap();
        assert!(result.is_none());

        // Verify it was removed
        assert!(store.cache.get("expired_key").await.is_none());
    }

    #[tokio::test]
    async fn test_refreshed_entry_survives_expiry_cleanup() {
        let store = MokaStore::new(MokaStoreConfig::default());
        let seen_at = now_ms();

        // Written again after a reader saw the old entry expire.
        store.set_ex("k", "fresh".to_string(), 60).await.unwrap();
        store.invalidate_expired("k", seen_at).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("fresh"));

        let stale = Slot {
            expires: seen_at - 1,
            payload: "stale".to_string(),
        };
        store.cache.insert("k".to_string(), stale).await;
        store.invalidate_expired("k", seen_at).await;
        assert!(store.cache.get("k").await.is_none());
    }
}
