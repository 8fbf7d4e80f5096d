//! Metrics middleware for cache stores.
//!
//! This module provides a `MetricsStore` wrapper that emits metrics for all
//! store operations (reads, writes, deletes) to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cache_aside::{MokaStore, MokaStoreConfig, Store};
//! use cache_aside::{StoreMetric, MetricsSink, MetricsStore};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//!
//! let moka = Arc::new(MokaStore::new(MokaStoreConfig::default()));
//! let store: Arc<dyn Store> = Arc::new(MetricsStore::new(moka, sink.clone()));
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::error::CacheError;
use crate::store::Store;

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone)]
pub enum StoreMetric {
    /// Emitted on every read.
    Read {
        key: String,
        /// Whether the key was found. `false` on error as well.
        hit: bool,
        success: bool,
        latency_ms: f64,
        /// Name of the wrapped store (from Store::name()).
        tier: String,
    },
    /// Emitted on every write.
    Write {
        key: String,
        ttl_secs: u64,
        success: bool,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every delete.
    Delete {
        key: String,
        success: bool,
        latency_ms: f64,
        tier: String,
    },
}

/// Trait for receiving store metrics.
///
/// # Example
///
/// ```ignore
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use cache_aside::{StoreMetric, MetricsSink};
///
/// struct BufferedSink {
///     buffer: Mutex<Vec<StoreMetric>>,
/// }
///
/// #[async_trait]
/// impl MetricsSink for BufferedSink {
///     fn emit(&self, metric: StoreMetric) {
///         self.buffer.lock().unwrap().push(metric);
///     }
///
///     async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// Called in the hot path of every store operation; keep it cheap.
    fn emit(&self, metric: StoreMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A store wrapper that emits metrics for all operations.
pub struct MetricsStore {
    inner: Arc<dyn Store>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl MetricsStore {
    /// Create a new MetricsStore wrapping the given store.
    pub fn new(inner: Arc<dyn Store>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            tier_name,
        }
    }

    /// Get a reference to the metrics sink.
    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl Store for MetricsStore {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(StoreMetric::Read {
            key: key.to_string(),
            hit: matches!(result, Ok(Some(_))),
            success: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.set_ex(key, value, ttl_secs).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(StoreMetric::Write {
            key: key.to_string(),
            ttl_secs,
            success: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(StoreMetric::Delete {
            key: key.to_string(),
            success: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }
}
