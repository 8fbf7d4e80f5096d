/// Error type for the caching layer.
///
/// None of these ever reach the caller of an intercepted operation: the
/// interceptor logs them and falls back to the underlying call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The cache key could not be derived (bad key expression or descriptor).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A store read failed.
    #[error("[{tier}] read failed for key '{key}': {message}")]
    Read {
        tier: String,
        key: String,
        message: String,
    },

    /// A store write failed.
    #[error("[{tier}] write failed for key '{key}': {message}")]
    Write {
        tier: String,
        key: String,
        message: String,
    },

    /// A store delete failed.
    #[error("[{tier}] delete failed for key '{key}': {message}")]
    Delete {
        tier: String,
        key: String,
        message: String,
    },

    /// Serialization or deserialization of a cached value failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration, detected when the interceptor is built.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub fn read(tier: impl Into<String>, key: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Read {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn write(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Write {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn delete(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Delete {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}
