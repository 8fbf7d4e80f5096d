//! The cache-aside interceptor.
//!
//! Read-through operations check the store first and only run the underlying
//! call on a miss, writing its result back. Evict operations run the call
//! first and delete the key only if it succeeded.
//!
//! The caching layer fails open: any key, store or codec error is logged and
//! the call proceeds as if no cache existed. Errors of the underlying call are
//! returned unchanged and never cached.

use serde::{Serialize, de::DeserializeOwned};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::args::Args;
use crate::codec::{Codec, JsonCodec};
use crate::descriptor::{CacheDescriptor, CacheKind, DescriptorTable, OperationId};
use crate::error::CacheError;
use crate::key::{CacheKey, KeyBuilder};
use crate::store::Store;

/// Outcome of the cache lookup half of a read-through call.
enum Lookup<T> {
    Hit(T),
    Miss { key: CacheKey, ttl_secs: i64 },
}

/// Wraps async operations with cache-aside semantics.
///
/// Holds no per-call state; one instance can serve any number of concurrent
/// calls. Concurrent misses on the same key each run the underlying call and
/// write back (last writer wins).
pub struct CacheAside<C = JsonCodec> {
    store: Arc<dyn Store>,
    codec: C,
    keys: KeyBuilder,
    descriptors: Arc<DescriptorTable>,
    max_ttl_secs: u64,
}

impl<C: Clone> Clone for CacheAside<C> {
    fn clone(&self) -> Self {
        CacheAside {
            store: Arc::clone(&self.store),
            codec: self.codec.clone(),
            keys: self.keys.clone(),
            descriptors: Arc::clone(&self.descriptors),
            max_ttl_secs: self.max_ttl_secs,
        }
    }
}

impl<C: Codec> CacheAside<C> {
    pub(crate) fn from_parts(
        store: Arc<dyn Store>,
        codec: C,
        keys: KeyBuilder,
        descriptors: DescriptorTable,
        max_ttl_secs: u64,
    ) -> Self {
        CacheAside {
            store,
            codec,
            keys,
            descriptors: Arc::new(descriptors),
            max_ttl_secs,
        }
    }

    /// Run `call` under the metadata registered for `operation`.
    ///
    /// Operations without metadata are passed straight through: no key is
    /// derived and the store is not touched.
    ///
    /// # Example
    /// ```ignore
    /// let user = cache
    ///     .invoke(&GET_USER, &Args::new().arg("id", id), || repo.find(id))
    ///     .await?;
    /// ```
    pub async fn invoke<T, E, F, Fut>(&self, operation: &OperationId, args: &Args, call: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(descriptor) = self.descriptors.get(operation) else {
            return call().await;
        };

        match descriptor.kind {
            CacheKind::ReadThrough => self.read_through(descriptor, args, call).await,
            CacheKind::Evict => self.evict(descriptor, args, call).await,
        }
    }

    /// Read-through branch.
    ///
    /// On a hit the cached value is returned without running `call`. On a
    /// miss `call` runs and a successful result is written back with the
    /// descriptor's TTL (or the maximum TTL when it is `<= 0`). If the key
    /// could not be derived or the store read failed, `call` runs and nothing
    /// is written back.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        descriptor: &CacheDescriptor,
        args: &Args,
        call: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let write_back = match self.lookup::<T>(descriptor, args).await {
            Ok(Lookup::Hit(value)) => return Ok(value),
            Ok(Lookup::Miss { key, ttl_secs }) => Some((key, ttl_secs)),
            Err(e) => {
                tracing::warn!(
                    "Cache lookup failed, bypassing cache: operation={}, error={}",
                    descriptor.operation,
                    e
                );
                None
            }
        };

        let value = call().await?;

        if let Some((key, ttl_secs)) = write_back {
            self.populate(&key, &value, ttl_secs).await;
        }

        Ok(value)
    }

    /// Evict branch.
    ///
    /// `call` always runs first. Only if it succeeds is the key derived and
    /// deleted; eviction failures are logged and swallowed.
    pub async fn evict<T, E, F, Fut>(
        &self,
        descriptor: &CacheDescriptor,
        args: &Args,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = call().await?;

        if let Err(e) = self.remove(descriptor, args).await {
            tracing::warn!(
                "Cache eviction failed: operation={}, error={}",
                descriptor.operation,
                e
            );
        }

        Ok(value)
    }

    /// TTL actually sent to the store for a declared TTL.
    pub fn effective_ttl(&self, ttl_secs: i64) -> u64 {
        if ttl_secs > 0 {
            ttl_secs as u64
        } else {
            self.max_ttl_secs
        }
    }

    /// Metadata registered for `operation`, if any.
    pub fn descriptor(&self, operation: &OperationId) -> Option<&CacheDescriptor> {
        self.descriptors.get(operation)
    }

    pub fn key_builder(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    async fn lookup<T>(&self, descriptor: &CacheDescriptor, args: &Args) -> Result<Lookup<T>, CacheError>
    where
        T: DeserializeOwned + 'static,
    {
        let (key, ttl_secs) = self.keys.read_key(descriptor, args)?;

        let Some(payload) = self.store.get(key.as_str()).await? else {
            tracing::debug!("Cache miss: key={}", key);
            return Ok(Lookup::Miss { key, ttl_secs });
        };

        tracing::debug!("Cache hit: key={}", key);

        if let Some(unit) = unit_value::<T>() {
            return Ok(Lookup::Hit(unit));
        }

        match self.codec.decode::<T>(&payload) {
            Ok(value) => Ok(Lookup::Hit(value)),
            Err(e) => {
                // Unreadable entry: recompute and overwrite it.
                tracing::warn!("Discarding undecodable cache entry: key={}, error={}", key, e);
                Ok(Lookup::Miss { key, ttl_secs })
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: i64) {
        let ttl = self.effective_ttl(ttl_secs);
        let result = match self.codec.encode(value) {
            Ok(payload) => self.store.set_ex(key.as_str(), payload, ttl).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::debug!("Cache populated: key={}, ttl_secs={}", key, ttl);
            }
            Err(e) => {
                tracing::warn!("Cache write failed: key={}, error={}", key, e);
            }
        }
    }

    async fn remove(&self, descriptor: &CacheDescriptor, args: &Args) -> Result<(), CacheError> {
        let key = self.keys.evict_key(descriptor, args)?;
        self.store.delete(key.as_str()).await?;
        tracing::debug!("Cache evicted: key={}", key);
        Ok(())
    }
}

/// `Some(())` when `T` is the unit type, so "no value" results can be served
/// from cache without decoding the payload.
fn unit_value<T: 'static>() -> Option<T> {
    let unit: Box<dyn Any> = Box::new(());
    unit.downcast::<T>().ok().map(|b| *b)
}
