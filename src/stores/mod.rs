//! Store implementations for the cache library.

pub mod memory;
pub mod metrics;
pub mod moka;
pub mod redis;

pub use memory::{MemoryStore, MemoryStoreConfig};
pub use metrics::{MetricsSink, MetricsStore, StoreMetric};
pub use moka::{MokaStore, MokaStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
