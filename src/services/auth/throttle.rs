//! Fixed-window login attempt limiter keyed by client address.
use std::{future::Future, pin::Pin, time::Duration};

use crate::services::cache::{CacheClient, CacheError};

pub type ThrottleFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ThrottleError>> + Send + 'a>>;

/// Login throttle:
/// - `is_blocked`: the client already used up its attempts in the current window
/// - `record_failure`: count one failed attempt, returns the running total
/// - `reset`: forget the client (successful login)
pub trait LoginThrottle: Send + Sync {
    fn is_blocked<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, bool>;

    fn record_failure<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, u64>;

    fn reset<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, ()>;
}

#[derive(Debug, thiserror::Error)]
pub enum ThrottleError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Clone, Debug)]
pub struct CacheLoginThrottle<C: CacheClient> {
    cache: C,
    prefix: String,
    max_attempts: u64,
    window: Duration,
}

impl<C: CacheClient> CacheLoginThrottle<C> {
    pub fn new(cache: C, prefix: impl Into<String>, max_attempts: u64, window: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            max_attempts,
            window,
        }
    }

    fn key(&self, client: &str) -> String {
        format!("{}:{}", self.prefix, client)
    }
}

impl<C: CacheClient> LoginThrottle for CacheLoginThrottle<C> {
    fn is_blocked<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, bool> {
        Box::pin(async move {
            let attempts = match self.cache.get_string(&self.key(client)).await? {
                Some(v) => v
                    .parse::<u64>()
                    .map_err(|e| CacheError::InvalidValue(e.to_string()))?,
                None => 0,
            };
            Ok(attempts >= self.max_attempts)
        })
    }

    fn record_failure<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, u64> {
        Box::pin(async move {
            let n = self
                .cache
                .incr_with_ttl(&self.key(client), self.window)
                .await?;
            Ok(n)
        })
    }

    fn reset<'a>(&'a self, client: &'a str) -> ThrottleFuture<'a, ()> {
        Box::pin(async move {
            self.cache.del(&self.key(client)).await?;
            Ok(())
        })
    }
}
