//! Process-local caches
//!
//! Two independent namespaces share the [`TtlCache`] engine:
//!
//! - [`ResponseCache`]: serialized list responses, short TTL, dropped wholesale on any
//!   listing write
//! - [`ImageCache`]: rendered image variants, long TTL, dropped per listing on writes
//!
//! Both are plain structs handed to the services that use them; there is no global
//! cache state. Concurrent misses on the same key are not coalesced.

pub mod clock;
pub mod ttl_cache;

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl_cache::{CacheStats, TtlCache};

use crate::config::CacheConfig;

/// Key prefix shared by every cached listing query
pub const LIST_PREFIX: &str = "list:";

/// Cache of JSON response payloads keyed by the query that produced them
pub struct ResponseCache {
    inner: TtlCache<serde_json::Value>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: TtlCache::new("response", ttl, capacity, clock),
        }
    }

    /// Key for a listing query: `list:` followed by the serialized query description
    pub fn list_key<Q: Serialize>(query: &Q) -> String {
        format!(
            "{LIST_PREFIX}{}",
            serde_json::to_string(query).unwrap_or_default()
        )
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.get(key).await
    }

    pub async fn set(&self, key: impl Into<String>, payload: serde_json::Value) {
        self.inner.set(key, payload).await;
    }

    pub async fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        self.inner.invalidate_by_prefix(prefix).await
    }

    /// Drop every cached listing query
    pub async fn invalidate_listings(&self) {
        let removed = self.inner.invalidate_by_prefix(LIST_PREFIX).await;
        debug!(removed, "listing response cache invalidated");
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}

/// Rendered image bytes with their MIME type
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Cache of rendered image variants
pub struct ImageCache {
    inner: TtlCache<CachedImage>,
}

impl ImageCache {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: TtlCache::new("image", ttl, capacity, clock),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CachedImage> {
        self.inner.get(key).await
    }

    pub async fn set(&self, key: impl Into<String>, image: CachedImage) {
        self.inner.set(key, image).await;
    }

    /// Drop every variant rendered under `scope` (e.g. one listing's images)
    pub async fn invalidate_scope(&self, scope: &str) -> usize {
        let removed = self.inner.invalidate_by_prefix(&format!("{scope}/")).await;
        debug!(scope, removed, "image cache scope invalidated");
        removed
    }

    /// Drop every rendered variant of one listing's images
    pub async fn invalidate_listing(&self, listing_id: &uuid::Uuid) -> usize {
        self.invalidate_scope(&listing_id.to_string()).await
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}

/// Both caches, built from configuration around one clock
#[derive(Clone)]
pub struct Caches {
    pub responses: Arc<ResponseCache>,
    pub images: Arc<ImageCache>,
}

impl Caches {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            responses: Arc::new(ResponseCache::new(
                config.response_ttl,
                config.response_max_entries,
                clock.clone(),
            )),
            images: Arc::new(ImageCache::new(
                config.image_ttl,
                config.image_max_entries,
                clock,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_keys_share_prefix_and_differ_by_query() {
        let a = ResponseCache::list_key(&json!({"page": 1}));
        let b = ResponseCache::list_key(&json!({"page": 2}));
        assert!(a.starts_with(LIST_PREFIX));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_invalidate_listings_leaves_other_keys() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10, Arc::new(SystemClock));
        cache.set(ResponseCache::list_key(&json!({"page": 1})), json!([1])).await;
        cache.set("stats:global", json!({"n": 1})).await;

        cache.invalidate_listings().await;

        assert!(cache.get(&ResponseCache::list_key(&json!({"page": 1}))).await.is_none());
        assert!(cache.get("stats:global").await.is_some());
    }

    #[tokio::test]
    async fn test_image_scope_invalidation_is_exact() {
        let cache = ImageCache::new(Duration::from_secs(60), 10, Arc::new(SystemClock));
        let image = CachedImage {
            mime_type: "image/png".to_string(),
            bytes: Bytes::from_static(b"png"),
        };
        cache.set("listing-1/cover/abc", image.clone()).await;
        cache.set("listing-10/cover/abc", image).await;

        assert_eq!(cache.invalidate_scope("listing-1").await, 1);
        assert!(cache.get("listing-10/cover/abc").await.is_some());
    }
}
