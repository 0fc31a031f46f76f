use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::{byte_size, duration};

/// Prefix for environment overrides, e.g. `WEBBUSES_WEB__PORT=8080`
pub const ENV_PREFIX: &str = "WEBBUSES_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub listings: ListingsConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    /// Image CDN credentials; uploads are stored inline when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<CdnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_request_size", with = "byte_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_response_ttl", with = "duration")]
    pub response_ttl: Duration,
    #[serde(default = "default_response_max_entries")]
    pub response_max_entries: usize,
    #[serde(default = "default_image_ttl", with = "duration")]
    pub image_ttl: Duration,
    #[serde(default = "default_image_max_entries")]
    pub image_max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Image shown when a listing has neither a cover nor a gallery image
    #[serde(default = "default_cover_placeholder")]
    pub cover_placeholder: String,
    /// Reject listing creation when no cover and no gallery image is supplied
    #[serde(default = "default_require_cover_on_create")]
    pub require_cover_on_create: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_max_upload_size", with = "byte_size")]
    pub max_upload_size: usize,
    #[serde(default = "default_image_quality")]
    pub default_quality: u8,
    #[serde(default = "default_max_image_width")]
    pub max_width: u32,
    #[serde(default = "default_fetch_timeout", with = "duration")]
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdnConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_cdn_folder")]
    pub folder: String,
    #[serde(default = "default_cdn_upload_transformation")]
    pub upload_transformation: String,
    #[serde(default = "default_cdn_thumbnail_transformation")]
    pub thumbnail_transformation: String,
    #[serde(default = "default_cdn_api_base")]
    pub api_base: String,
    #[serde(default = "default_cdn_delivery_base")]
    pub delivery_base: String,
}

fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_request_size() -> usize {
    DEFAULT_MAX_REQUEST_SIZE
}

// Cache defaults
fn default_response_ttl() -> Duration {
    Duration::from_secs(DEFAULT_RESPONSE_CACHE_TTL_SECS)
}

fn default_response_max_entries() -> usize {
    DEFAULT_RESPONSE_CACHE_MAX_ENTRIES
}

fn default_image_ttl() -> Duration {
    Duration::from_secs(DEFAULT_IMAGE_CACHE_TTL_SECS)
}

fn default_image_max_entries() -> usize {
    DEFAULT_IMAGE_CACHE_MAX_ENTRIES
}

// Listing defaults
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_cover_placeholder() -> String {
    DEFAULT_COVER_PLACEHOLDER.to_string()
}

fn default_require_cover_on_create() -> bool {
    DEFAULT_REQUIRE_COVER_ON_CREATE
}

// Image defaults
fn default_max_upload_size() -> usize {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_image_quality() -> u8 {
    DEFAULT_IMAGE_QUALITY
}

fn default_max_image_width() -> u32 {
    DEFAULT_MAX_IMAGE_WIDTH
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
}

// CDN defaults
fn default_cdn_folder() -> String {
    DEFAULT_CDN_FOLDER.to_string()
}

fn default_cdn_upload_transformation() -> String {
    DEFAULT_CDN_UPLOAD_TRANSFORMATION.to_string()
}

fn default_cdn_thumbnail_transformation() -> String {
    DEFAULT_CDN_THUMBNAIL_TRANSFORMATION.to_string()
}

fn default_cdn_api_base() -> String {
    DEFAULT_CDN_API_BASE.to_string()
}

fn default_cdn_delivery_base() -> String {
    DEFAULT_CDN_DELIVERY_BASE.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_ttl: default_response_ttl(),
            response_max_entries: default_response_max_entries(),
            image_ttl: default_image_ttl(),
            image_max_entries: default_image_max_entries(),
        }
    }
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cover_placeholder: default_cover_placeholder(),
            require_cover_on_create: default_require_cover_on_create(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            default_quality: default_image_quality(),
            max_width: default_max_image_width(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_cdn_folder(),
            upload_transformation: default_cdn_upload_transformation(),
            thumbnail_transformation: default_cdn_thumbnail_transformation(),
            api_base: default_cdn_api_base(),
            delivery_base: default_cdn_delivery_base(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: Some(DEFAULT_MAX_CONNECTIONS),
                min_connections: DEFAULT_MIN_CONNECTIONS,
            },
            web: WebConfig {
                host: default_host(),
                port: default_port(),
                max_request_size: default_max_request_size(),
            },
            cache: CacheConfig::default(),
            listings: ListingsConfig::default(),
            images: ImagesConfig::default(),
            cdn: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load configuration layered as defaults < TOML file < `WEBBUSES_*` environment.
    ///
    /// A missing file is created with the defaults so operators have something to edit.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !std::path::Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config to {config_file}"))?;
            info!("Created default config file: {}", config_file);
        }

        let config: Config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Invalid configuration in {config_file}"))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make the service misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        if self.listings.default_page_size == 0 || self.listings.max_page_size == 0 {
            anyhow::bail!("listings page sizes must be greater than zero");
        }
        if self.listings.default_page_size > self.listings.max_page_size {
            anyhow::bail!(
                "listings.default_page_size ({}) exceeds listings.max_page_size ({})",
                self.listings.default_page_size,
                self.listings.max_page_size
            );
        }
        if self.cache.response_max_entries == 0 || self.cache.image_max_entries == 0 {
            anyhow::bail!("cache capacities must be greater than zero");
        }
        if !(1..=100).contains(&self.images.default_quality) {
            anyhow::bail!("images.default_quality must be between 1 and 100");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.web.port, 5000);
        assert_eq!(config.cache.response_ttl, Duration::from_secs(60));
        assert!(config.cdn.is_none());
    }

    #[test]
    fn test_load_creates_default_file_and_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let created = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert_eq!(created.listings.default_page_size, DEFAULT_PAGE_SIZE);

        std::fs::write(
            &path,
            r#"
[database]
url = "sqlite::memory:"

[web]
port = 9000
max_request_size = "5MB"

[cache]
response_ttl = "2m"
"#,
        )
        .unwrap();

        let loaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(loaded.web.port, 9000);
        assert_eq!(loaded.web.max_request_size, 5 * 1024 * 1024);
        assert_eq!(loaded.cache.response_ttl, Duration::from_secs(120));
        assert_eq!(loaded.cache.image_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_validate_rejects_inverted_page_sizes() {
        let mut config = Config::default();
        config.listings.default_page_size = 200;
        assert!(config.validate().is_err());
    }
}
