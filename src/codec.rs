//! Value codec between operation results and stored payloads.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CacheError;

/// Converts operation results to and from the payloads kept in a `Store`.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CacheError>;

    fn decode<T: DeserializeOwned>(&self, payload: &str) -> Result<T, CacheError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CacheError> {
        serde_json::to_string(value)
            .map_err(|e| CacheError::Serialization(format!("Serialization failed: {}", e)))
    }

    fn decode<T: DeserializeOwned>(&self, payload: &str) -> Result<T, CacheError> {
        serde_json::from_str(payload)
            .map_err(|e| CacheError::Serialization(format!("Deserialization failed: {}", e)))
    }
}
