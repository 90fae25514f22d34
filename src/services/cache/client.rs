//! Cache client interface used by higher-level services (login throttling).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/serialization).
///
/// Kept independent from `AppError` so callers decide how to fail
/// (the login throttle fails open, for example).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

/// A minimal cache interface.
///
/// Small and string-keyed: fixed-window counters only need `INCR` + TTL, `GET` and `DEL`.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside)
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Increment an integer counter, creating it at 1.
    //
    // The TTL is attached when the counter is created and not extended afterwards,
    // which gives fixed-window semantics.
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64>;

    // Delete a key. Returns number of deleted keys.
    async fn del(&self, key: &str) -> CacheResult<u64>;
}
