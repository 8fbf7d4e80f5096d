use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::store::Store;

use crate::utils::{expires_at, now_ms};

/// Configuration for MemoryStore.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Upper bound on stored entries. When a write would exceed it, expired
    /// entries are purged first, then the entries closest to expiry.
    ///
    /// `None` means unbounded.
    pub max_items: Option<usize>,
}

/// Internal stored entry with expiration time.
#[derive(Clone)]
struct StoredEntry {
    expires: i64,
    payload: String,
}

/// Thread-safe in-memory store using HashMap with RwLock.
///
/// Suitable for tests, single-process deployments and as a stand-in for a
/// remote store during development. For high concurrency prefer `MokaStore`.
pub struct MemoryStore {
    state: RwLock<HashMap<String, StoredEntry>>,
    max_items: Option<usize>,
}

impl MemoryStore {
    /// Create a new MemoryStore with the given configuration.
    pub fn new(config: MemoryStoreConfig) -> Self {
        MemoryStore {
            state: RwLock::new(HashMap::new()),
            max_items: config.max_items,
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = now_ms();
        let state = self.state.read().await;
        state.values().filter(|v| v.expires > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn evict(state: &mut HashMap<String, StoredEntry>, max_items: usize) {
        let now = now_ms();

        // First delete all expired entries
        state.retain(|_, v| v.expires > now);

        if state.len() >= max_items {
            let mut entries: Vec<_> = state.iter().map(|(k, v)| (k.clone(), v.expires)).collect();
            entries.sort_by_key(|(_, expires)| *expires);

            let to_remove = state.len() + 1 - max_items;
            for (key, _) in entries.into_iter().take(to_remove) {
                state.remove(&key);
            }
        }
    }

    /// Remove `key` only if it is still expired at `now`; a concurrent write
    /// may have replaced it since it was read.
    fn remove_expired(state: &mut HashMap<String, StoredEntry>, key: &str, now: i64) {
        if state.get(key).is_some_and(|entry| entry.expires <= now) {
            state.remove(key);
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let state = self.state.read().await;

        let Some(stored) = state.get(key) else {
            return Ok(None);
        };

        let now = now_ms();
        if stored.expires <= now {
            drop(state);
            let mut state = self.state.write().await;
            Self::remove_expired(&mut state, key, now);
            return Ok(None);
        }

        Ok(Some(stored.payload.clone()))
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let mut state = self.state.write().await;

        if let Some(max_items) = self.max_items {
            if !state.contains_key(key) {
                Self::evict(&mut state, max_items);
            }
        }

        state.insert(
            key.to_string(),
            StoredEntry {
                expires: expires_at(ttl_secs),
                payload: value,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.remove(key);
        Ok(())
    }
}
