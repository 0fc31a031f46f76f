//! Data access for listings, advertisers and likes
//!
//! Services only see the traits in [`traits`]; the SeaORM implementations here are
//! wired up in `web::AppState`.

pub mod advertiser;
pub mod like;
pub mod listing;
pub mod traits;

pub use advertiser::AdvertiserSeaOrmRepository;
pub use like::LikeSeaOrmRepository;
pub use listing::ListingSeaOrmRepository;
pub use traits::{AdvertiserStore, LikeStore, ListingStore};
