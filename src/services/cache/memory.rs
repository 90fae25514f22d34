//! Process-local cache for development and tests (no Valkey configured).
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Expired entries are swept every this many writes.
const SWEEP_EVERY: u64 = 64;
/// Longest lifetime an entry can get, whatever TTL the caller asks for.
const MAX_TTL: Duration = Duration::from_secs(365 * 86_400);

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, Entry>,
    writes: u64,
}

impl Store {
    fn sweep_if_due(&mut self, now: Instant) {
        self.writes = self.writes.wrapping_add(1);
        if self.writes % SWEEP_EVERY == 0 {
            self.entries.retain(|_, e| e.expires_at > now);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    store: Arc<Mutex<Store>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| CacheError::BackendCommand("memory cache lock poisoned".into()))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }
}

fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now)
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut store = self.lock()?;
        let now = Instant::now();

        match store.entries.get(key) {
            Some(e) if e.expires_at > now => Ok(Some(e.value.clone())),
            Some(_) => {
                store.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> CacheResult<u64> {
        let mut store = self.lock()?;
        let now = Instant::now();
        store.sweep_if_due(now);

        let current = match store.entries.get(key) {
            Some(e) if e.expires_at > now => Some(
                e.value
                    .parse::<u64>()
                    .map_err(|e| CacheError::InvalidValue(e.to_string()))?,
            ),
            _ => None,
        };

        let count = match current {
            Some(n) => {
                let next = n.saturating_add(1);
                if let Some(e) = store.entries.get_mut(key) {
                    e.value = next.to_string();
                }
                next
            }
            None => {
                store.entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".into(),
                        expires_at: expiry(now, ttl),
                    },
                );
                1
            }
        };

        Ok(count)
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        Ok(self.lock()?.entries.remove(key).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_counts_within_window() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.incr_with_ttl("k", ttl).await.unwrap(), 1);
        assert_eq!(cache.incr_with_ttl("k", ttl).await.unwrap(), 2);
        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn expired_counter_restarts() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_millis(20);

        cache.incr_with_ttl("k", ttl).await.unwrap();
        cache.incr_with_ttl("k", ttl).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get_string("k").await.unwrap(), None);
        assert_eq!(cache.incr_with_ttl("k", ttl).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn expired_keys_are_swept_without_being_read_again() {
        let cache = MemoryCache::new();
        let short = Duration::from_millis(20);

        for i in 0..100 {
            cache
                .incr_with_ttl(&format!("ip:{i}"), short)
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 100);

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Writes to an unrelated key alone must clear the stale ones.
        for _ in 0..SWEEP_EVERY {
            cache
                .incr_with_ttl("ip:fresh", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn huge_ttl_does_not_panic() {
        let cache = MemoryCache::new();

        assert_eq!(
            cache.incr_with_ttl("k", Duration::MAX).await.unwrap(),
            1
        );
        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn del_reports_removed_keys() {
        let cache = MemoryCache::new();
        cache
            .incr_with_ttl("k", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(cache.del("k").await.unwrap(), 1);
        assert_eq!(cache.del("k").await.unwrap(), 0);
    }
}
