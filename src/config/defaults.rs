/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/webbuses.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 30 * 1024 * 1024; // 30MB

// Response cache defaults
pub const DEFAULT_RESPONSE_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_RESPONSE_CACHE_MAX_ENTRIES: usize = 500;

// Image cache defaults
pub const DEFAULT_IMAGE_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_IMAGE_CACHE_MAX_ENTRIES: usize = 200;

// Listing defaults
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_COVER_PLACEHOLDER: &str = "https://webbuses.com/logo.png";
pub const DEFAULT_REQUIRE_COVER_ON_CREATE: bool = true;

// Image defaults
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024; // 10MB per file
pub const DEFAULT_IMAGE_QUALITY: u8 = 80;
pub const DEFAULT_MAX_IMAGE_WIDTH: u32 = 2048;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// CDN defaults
pub const DEFAULT_CDN_FOLDER: &str = "webbuses";
pub const DEFAULT_CDN_UPLOAD_TRANSFORMATION: &str = "c_limit,w_1280,h_720/q_auto/f_auto";
pub const DEFAULT_CDN_THUMBNAIL_TRANSFORMATION: &str = "c_fill,w_480,h_270/q_auto/f_auto";
pub const DEFAULT_CDN_API_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_CDN_DELIVERY_BASE: &str = "https://res.cloudinary.com";
