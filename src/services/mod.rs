//! Business logic between the HTTP handlers and the stores

pub mod advertiser_service;
pub mod like_service;
pub mod listing_service;
pub mod maintenance;

pub use advertiser_service::AdvertiserService;
pub use like_service::LikeService;
pub use listing_service::{ImageSlot, ListingService, ListingUploads};
pub use maintenance::{MaintenanceService, MigrationOptions, MigrationSummary};
