//! cache-aside - A cache-aside interceptor for async operations
//!
//! This library wraps arbitrary async calls with a caching protocol:
//! - Read-through: serve from the store, run the call and write back on miss
//! - Evict: run the (mutating) call, then delete the entry
//! - Keys derived from declarative metadata and call arguments
//! - Fail-open: caching errors are logged and never reach the caller
//!
//! # Example
//!
//! ```ignore
//! use cache_aside::{
//!     Args, CacheAsideBuilder, CacheAsideConfig, CacheEvict, Cacheable, MemoryStore,
//!     MemoryStoreConfig, OperationId,
//! };
//! use std::sync::Arc;
//!
//! const GET_USER: OperationId = OperationId::new("UserService", "get_user");
//! const RENAME_USER: OperationId = OperationId::new("UserService", "rename_user");
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new(MemoryStoreConfig::default()));
//!
//!     let cache = CacheAsideBuilder::new(CacheAsideConfig::new("shop"))
//!         .store(store)
//!         .cacheable(GET_USER, Cacheable::new("user").ttl_secs(120))
//!         .evict(RENAME_USER, CacheEvict::new("user").key("#id"))
//!         .build()?;
//!
//!     // Key: shop:ca:user:42
//!     let user = cache
//!         .invoke(&GET_USER, &Args::new().arg("id", 42), || async {
//!             db.find_user(42).await
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

mod args;
mod builder;
mod codec;
mod config;
mod descriptor;
mod error;
mod expr;
mod interceptor;
mod key;
mod store;
pub mod stores;
mod utils;

// Re-export public API
pub use args::{Args, render};
pub use builder::CacheAsideBuilder;
pub use codec::{Codec, JsonCodec};
pub use config::{CacheAsideConfig, MAX_TTL_SECS};
pub use descriptor::{
    CacheDescriptor, CacheEvict, CacheKind, Cacheable, DEFAULT_TTL_SECS, DescriptorTable,
    OperationId,
};
pub use error::CacheError;
pub use expr::{ExprError, KeyEvaluator, PathEvaluator};
pub use interceptor::CacheAside;
pub use key::{CacheKey, KeyBuilder};
pub use store::Store;
pub use stores::memory::{MemoryStore, MemoryStoreConfig};
pub use stores::metrics::{MetricsSink, MetricsStore, StoreMetric};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{RedisStore, RedisStoreConfig};
