//! On-demand image rendering backed by the image cache

use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::source::{decode_data_uri, ImageSource};
use super::transcode::{sniff_mime, transcode, ImageVariant};
use crate::cache::{CachedImage, ImageCache};
use crate::config::ImagesConfig;
use crate::errors::{AppError, AppResult};

/// Image bytes ready to be served
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub mime_type: String,
    pub bytes: Bytes,
    pub from_cache: bool,
}

pub struct ImageProxy {
    http_client: Client,
    cache: Arc<ImageCache>,
    default_quality: u8,
    max_width: u32,
}

impl ImageProxy {
    pub fn new(config: &ImagesConfig, cache: Arc<ImageCache>) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("webbuses/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            cache,
            default_quality: config.default_quality,
            max_width: config.max_width,
        })
    }

    /// Build a variant from request parameters using the configured defaults and limits
    pub fn variant(
        &self,
        width: Option<u32>,
        quality: Option<u8>,
        format: Option<&str>,
    ) -> AppResult<ImageVariant> {
        ImageVariant::from_params(width, quality, format, self.default_quality, self.max_width)
    }

    /// Cache key: `<scope>/<source fingerprint>/<variant>`
    pub fn cache_key(scope: &str, source: &ImageSource, variant: &ImageVariant) -> String {
        format!(
            "{scope}/{}/{}",
            source.fingerprint(),
            variant.cache_suffix()
        )
    }

    /// Render `source` as `variant`, serving from the cache when a fresh copy exists.
    /// `scope` groups keys for invalidation, e.g. `<listing-id>/cover`.
    pub async fn render(
        &self,
        scope: &str,
        source: &ImageSource,
        variant: &ImageVariant,
    ) -> AppResult<RenderedImage> {
        let key = Self::cache_key(scope, source, variant);
        if let Some(cached) = self.cache.get(&key).await {
            trace!(key, "image cache hit");
            return Ok(RenderedImage {
                mime_type: cached.mime_type,
                bytes: cached.bytes,
                from_cache: true,
            });
        }

        let original = self.load(source).await?;
        let rendered = if variant.is_passthrough() {
            CachedImage {
                mime_type: sniff_mime(&original).to_string(),
                bytes: original,
            }
        } else {
            let variant = *variant;
            let input = original.clone();
            let result = tokio::task::spawn_blocking(move || transcode(&input, &variant))
                .await
                .map_err(|e| AppError::internal(format!("image worker failed: {e}")))?;

            match result {
                Ok(encoded) => CachedImage {
                    mime_type: encoded.mime_type.to_string(),
                    bytes: Bytes::from(encoded.bytes),
                },
                Err(e) => {
                    warn!(key, error = %e, "image transcoding failed, serving original bytes");
                    CachedImage {
                        mime_type: sniff_mime(&original).to_string(),
                        bytes: original,
                    }
                }
            }
        };

        debug!(key, bytes = rendered.bytes.len(), "image rendered");
        self.cache.set(key, rendered.clone()).await;

        Ok(RenderedImage {
            mime_type: rendered.mime_type,
            bytes: rendered.bytes,
            from_cache: false,
        })
    }

    async fn load(&self, source: &ImageSource) -> AppResult<Bytes> {
        match source {
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
            ImageSource::DataUri(uri) => decode_data_uri(uri).map(|(_, bytes)| bytes),
            ImageSource::Url(url) => {
                let response = self.http_client.get(url).send().await.map_err(|e| {
                    AppError::external_service("image host", format!("GET {url} failed: {e}"))
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(AppError::external_service(
                        "image host",
                        format!("GET {url} returned {status}"),
                    ));
                }

                response.bytes().await.map_err(|e| {
                    AppError::external_service("image host", format!("reading {url} failed: {e}"))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::images::source::encode_data_uri;
    use crate::images::transcode::tests::png_fixture;
    use std::time::Duration;

    fn proxy() -> (ImageProxy, Arc<ImageCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(ImageCache::new(Duration::from_secs(3600), 10, clock.clone()));
        let proxy = ImageProxy::new(&ImagesConfig::default(), cache.clone()).unwrap();
        (proxy, cache, clock)
    }

    #[tokio::test]
    async fn test_render_caches_variant() {
        let (proxy, cache, _clock) = proxy();
        let source = ImageSource::DataUri(encode_data_uri("image/png", &png_fixture(200, 100)));
        let variant = proxy.variant(Some(50), None, Some("jpeg")).unwrap();

        let first = proxy.render("listing/cover", &source, &variant).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.mime_type, "image/jpeg");

        let second = proxy.render("listing/cover", &source, &variant).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let (proxy, _cache, clock) = proxy();
        let source = ImageSource::Bytes(Bytes::from(png_fixture(20, 20)));
        let variant = proxy.variant(Some(10), None, Some("png")).unwrap();

        proxy.render("l/cover", &source, &variant).await.unwrap();
        clock.advance(Duration::from_secs(3600));
        let again = proxy.render("l/cover", &source, &variant).await.unwrap();
        assert!(!again.from_cache);
    }

    #[tokio::test]
    async fn test_undecodable_source_falls_back_to_original_bytes() {
        let (proxy, _cache, _clock) = proxy();
        let garbage = Bytes::from_static(b"GIF89a-but-truncated");
        let source = ImageSource::Bytes(garbage.clone());
        let variant = proxy.variant(Some(10), None, Some("png")).unwrap();

        let rendered = proxy.render("l/cover", &source, &variant).await.unwrap();
        assert_eq!(rendered.bytes, garbage);
        assert_eq!(rendered.mime_type, "image/gif");
    }

    #[tokio::test]
    async fn test_malformed_data_uri_is_a_validation_error() {
        let (proxy, _cache, _clock) = proxy();
        let source = ImageSource::DataUri("data:image/png;base64,@@@".to_string());
        let variant = proxy.variant(None, None, None).unwrap();

        let err = proxy.render("l/cover", &source, &variant).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_cache_keys_are_scoped() {
        let source = ImageSource::Url("https://cdn/a.jpg".to_string());
        let variant = ImageVariant::from_params(Some(320), Some(70), Some("webp"), 80, 2048).unwrap();
        let key = ImageProxy::cache_key("abc/cover", &source, &variant);
        assert!(key.starts_with("abc/cover/"));
        assert!(key.ends_with("/w320-q70-webp"));
    }
}
