//! Domain models shared by the store, the services and the HTTP layer

pub mod advertiser;
pub mod like;
pub mod listing;

pub use advertiser::{Advertiser, AdvertiserCreateRequest};
pub use like::{Like, LikeCount, LikeReceipt, LikeRequest};
pub use listing::{
    first_present, Listing, ListingCreateRequest, ListingFilter, ListingPage, ListingStatus,
    ListingUpdateRequest, Location, PageRequest, StatusUpdateRequest,
};
