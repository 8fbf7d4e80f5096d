use std::env;

use crate::error::CacheError;

/// Upper bound for entry TTLs (7 days), used whenever an operation declares
/// a TTL of zero or less.
pub const MAX_TTL_SECS: u64 = 3600 * 24 * 7;

/// Configuration for the cache-aside interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAsideConfig {
    /// Application prefix. Keys are written as `<prefix>:ca:<namespace>[:<operand>]`.
    ///
    /// Must not be blank.
    pub prefix: String,

    /// TTL applied when an operation declares `ttl_secs <= 0`.
    ///
    /// Default: 604800 (7 days)
    pub max_ttl_secs: u64,
}

impl Default for CacheAsideConfig {
    fn default() -> Self {
        CacheAsideConfig {
            prefix: "app".to_string(),
            max_ttl_secs: MAX_TTL_SECS,
        }
    }
}

impl CacheAsideConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        CacheAsideConfig {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Load from `CACHE_ASIDE_PREFIX` and `CACHE_ASIDE_MAX_TTL_SECS`, falling
    /// back to defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        CacheAsideConfig {
            prefix: env::var("CACHE_ASIDE_PREFIX").unwrap_or(defaults.prefix),
            max_ttl_secs: env::var("CACHE_ASIDE_MAX_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_ttl_secs),
        }
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.prefix.trim().is_empty() {
            return Err(CacheError::Config(
                "cache key prefix can not be empty".to_string(),
            ));
        }
        if self.max_ttl_secs == 0 {
            return Err(CacheError::Config(
                "max_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Prefix handed to the key builder: `<prefix>:ca`.
    pub(crate) fn key_prefix(&self) -> String {
        format!("{}:ca", self.prefix)
    }
}
