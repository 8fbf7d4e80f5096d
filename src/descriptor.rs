//! Declarative cache metadata and the per-operation descriptor table.

use std::collections::HashMap;
use std::fmt;

use crate::error::CacheError;
use crate::utils::simple_type_name;

/// Default TTL of a `Cacheable` operation, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 60;

/// Identity of an interceptable operation: declaring type and operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId {
    type_name: &'static str,
    name: &'static str,
}

impl OperationId {
    /// `type_name` should be the declaring type's simple name, e.g. `"UserService"`.
    pub const fn new(type_name: &'static str, name: &'static str) -> Self {
        OperationId { type_name, name }
    }

    /// Operation `name` declared on `T`; the type's simple name is derived
    /// from `std::any::type_name`.
    pub fn of<T: ?Sized>(name: &'static str) -> Self {
        OperationId {
            type_name: simple_type_name(std::any::type_name::<T>()),
            name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.name)
    }
}

/// Read-through metadata: serve from cache, populate on miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cacheable {
    /// Cache namespace; empty derives `<Type>:<operation>`.
    pub namespace: String,
    /// Key expression over named arguments; empty joins all argument values.
    pub key: String,
    /// Entry TTL in seconds; `<= 0` falls back to the maximum TTL.
    pub ttl_secs: i64,
}

impl Default for Cacheable {
    fn default() -> Self {
        Cacheable {
            namespace: String::new(),
            key: String::new(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl Cacheable {
    pub fn new(namespace: impl Into<String>) -> Self {
        Cacheable {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn key(mut self, expression: impl Into<String>) -> Self {
        self.key = expression.into();
        self
    }

    pub fn ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }
}

/// Evict metadata: remove the entry after the operation succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEvict {
    pub namespace: String,
    pub key: String,
}

impl CacheEvict {
    pub fn new(namespace: impl Into<String>) -> Self {
        CacheEvict {
            namespace: namespace.into(),
            key: String::new(),
        }
    }

    pub fn key(mut self, expression: impl Into<String>) -> Self {
        self.key = expression.into();
        self
    }
}

/// Which branch of the cache-aside protocol an operation follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    ReadThrough,
    Evict,
}

/// Static cache metadata of one operation, derived once and reused for every
/// call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDescriptor {
    pub operation: OperationId,
    /// As declared; may be empty (resolved by the key builder).
    pub namespace: String,
    pub key_expression: String,
    /// Only meaningful for `ReadThrough`.
    pub ttl_secs: i64,
    pub kind: CacheKind,
}

impl CacheDescriptor {
    pub fn read_through(operation: OperationId, meta: &Cacheable) -> Self {
        CacheDescriptor {
            operation,
            namespace: meta.namespace.clone(),
            key_expression: meta.key.clone(),
            ttl_secs: meta.ttl_secs,
            kind: CacheKind::ReadThrough,
        }
    }

    pub fn evict(operation: OperationId, meta: &CacheEvict) -> Self {
        CacheDescriptor {
            operation,
            namespace: meta.namespace.clone(),
            key_expression: meta.key.clone(),
            ttl_secs: 0,
            kind: CacheKind::Evict,
        }
    }
}

/// Descriptors by operation, built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    descriptors: HashMap<OperationId, CacheDescriptor>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// An operation carries at most one descriptor; registering a second one
    /// (of either kind) is a configuration error.
    pub fn insert(&mut self, descriptor: CacheDescriptor) -> Result<(), CacheError> {
        if let Some(existing) = self.descriptors.get(&descriptor.operation) {
            return Err(CacheError::Config(format!(
                "operation '{}' already has {:?} metadata, cannot also register {:?}",
                descriptor.operation, existing.kind, descriptor.kind
            )));
        }
        self.descriptors.insert(descriptor.operation, descriptor);
        Ok(())
    }

    pub fn get(&self, operation: &OperationId) -> Option<&CacheDescriptor> {
        self.descriptors.get(operation)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
