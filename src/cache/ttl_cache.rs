//! Bounded time-to-live cache shared by the response and image caches
//!
//! Entries expire a fixed time after they were written. When the cache is full the
//! entry written longest ago is evicted. Reads never change eviction order: the
//! underlying [`LruCache`] is only ever inspected with `peek`, so its "least recently
//! used" end is the oldest insertion.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

use super::clock::Clock;

#[derive(Debug, Clone)]
struct TimedEntry<V> {
    inserted_at: Instant,
    value: V,
}

/// Point-in-time counters for a cache
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
}

pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    entries: Mutex<LruCache<String, TimedEntry<V>>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum one)
    pub fn new(name: &'static str, ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fresh value for `key`, dropping it if it has outlived the TTL
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let fresh = match entries.peek(key) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.pop(key);
                trace!(cache = self.name, key, "stale entry dropped");
                None
            }
            None => None,
        };

        match fresh {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `value`, evicting the oldest entry first when the cache is full
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = TimedEntry {
            inserted_at: self.clock.now(),
            value,
        };

        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                trace!(cache = self.name, key = %evicted, "evicted oldest entry");
            }
        }
    }

    /// Remove every key starting with `prefix`, returning how many were removed
    pub async fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            entries: entries.len(),
            capacity: entries.cap().get(),
            ttl_secs: self.ttl.as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
