//! Builder API for creating cache-aside interceptors.
//!
//! Metadata is attached to operations here, once, and turned into a
//! read-only descriptor table consulted on every call.

use std::sync::Arc;

use crate::codec::{Codec, JsonCodec};
use crate::config::CacheAsideConfig;
use crate::descriptor::{CacheDescriptor, CacheEvict, Cacheable, DescriptorTable, OperationId};
use crate::error::CacheError;
use crate::expr::{KeyEvaluator, PathEvaluator};
use crate::interceptor::CacheAside;
use crate::key::KeyBuilder;
use crate::store::Store;

/// Builder for [`CacheAside`].
///
/// # Example
///
/// ```ignore
/// use cache_aside::{CacheAsideBuilder, CacheAsideConfig, Cacheable, CacheEvict, OperationId};
///
/// let cache = CacheAsideBuilder::new(CacheAsideConfig::new("shop"))
///     .store(redis)
///     .cacheable(OperationId::new("UserService", "get_user"), Cacheable::new("user"))
///     .evict(OperationId::new("UserService", "update_user"), CacheEvict::new("user").key("#user.id"))
///     .build()?;
/// ```
pub struct CacheAsideBuilder<C = JsonCodec> {
    config: CacheAsideConfig,
    store: Option<Arc<dyn Store>>,
    codec: C,
    evaluator: Arc<dyn KeyEvaluator>,
    descriptors: Vec<CacheDescriptor>,
}

impl CacheAsideBuilder<JsonCodec> {
    /// Create a new builder with the JSON codec and the built-in key evaluator.
    pub fn new(config: CacheAsideConfig) -> Self {
        CacheAsideBuilder {
            config,
            store: None,
            codec: JsonCodec,
            evaluator: Arc::new(PathEvaluator),
            descriptors: Vec::new(),
        }
    }
}

impl<C: Codec> CacheAsideBuilder<C> {
    /// Set the backing store. Required.
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the value codec.
    pub fn codec<C2: Codec>(self, codec: C2) -> CacheAsideBuilder<C2> {
        CacheAsideBuilder {
            config: self.config,
            store: self.store,
            codec,
            evaluator: self.evaluator,
            descriptors: self.descriptors,
        }
    }

    /// Replace the key expression evaluator.
    pub fn evaluator(mut self, evaluator: Arc<dyn KeyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Mark `operation` as read-through.
    pub fn cacheable(mut self, operation: OperationId, meta: Cacheable) -> Self {
        self.descriptors
            .push(CacheDescriptor::read_through(operation, &meta));
        self
    }

    /// Mark `operation` as evicting.
    pub fn evict(mut self, operation: OperationId, meta: CacheEvict) -> Self {
        self.descriptors.push(CacheDescriptor::evict(operation, &meta));
        self
    }

    /// Build the interceptor.
    ///
    /// Fails if the configuration is invalid, no store was set, or an
    /// operation was given more than one piece of metadata.
    pub fn build(self) -> Result<CacheAside<C>, CacheError> {
        self.config.validate()?;

        let store = self
            .store
            .ok_or_else(|| CacheError::Config("a store is required".to_string()))?;

        let mut table = DescriptorTable::new();
        for descriptor in self.descriptors {
            table.insert(descriptor)?;
        }

        let keys = KeyBuilder::with_evaluator(self.config.key_prefix(), self.evaluator);

        Ok(CacheAside::from_parts(
            store,
            self.codec,
            keys,
            table,
            self.config.max_ttl_secs,
        ))
    }
}
