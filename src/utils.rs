//! Shared utilities for the cache library.

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current time in milliseconds since UNIX epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Absolute expiry (unix millis) for an entry written now with the given TTL.
pub fn expires_at(ttl_secs: u64) -> i64 {
    now_ms().saturating_add((ttl_secs as i64).saturating_mul(1000))
}

/// Simple name of a Rust type: last path segment, generics stripped.
///
/// `my_app::service::UserService<Db>` becomes `UserService`.
pub fn simple_type_name(full: &str) -> &str {
    let without_generics = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
