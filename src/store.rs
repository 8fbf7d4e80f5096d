use async_trait::async_trait;

use crate::error::CacheError;

/// A store is the backing key-value cache the interceptor reads, writes and
/// evicts through.
///
/// Stores hold opaque serialized payloads; encoding is the `Codec`'s job.
/// Every operation may block on I/O. Timeouts and retries, if any, belong to
/// the implementation.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "memory"
    /// - "redis"
    fn name(&self) -> &'static str;

    /// Return the stored payload.
    ///
    /// The response must be `None` for cache misses. Failures must surface as
    /// `Err`, never as a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store the payload under `key`, expiring after `ttl_secs` seconds.
    ///
    /// `ttl_secs` is always positive; unlimited TTLs are resolved to a bounded
    /// maximum before reaching the store.
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    /// Remove the key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
