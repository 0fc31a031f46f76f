//! Store traits the services depend on
//!
//! Each trait has a SeaORM implementation in this module's siblings; unit tests swap in
//! the generated mocks to count store calls.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{Advertiser, Like, Listing, ListingFilter, ListingStatus, PageRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// One page of listings matching `filter`, newest first with id as tie-break
    async fn find_page(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> RepositoryResult<Vec<Listing>>;

    /// Number of listings matching `filter`
    async fn count(&self, filter: &ListingFilter) -> RepositoryResult<u64>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Listing>>;

    async fn insert(&self, listing: Listing) -> RepositoryResult<Listing>;

    /// Overwrite a stored listing; `None` when it no longer exists
    async fn update(&self, listing: Listing) -> RepositoryResult<Option<Listing>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> RepositoryResult<Option<Listing>>;

    /// Remove a listing, returning it when it existed
    async fn delete(&self, id: Uuid) -> RepositoryResult<Option<Listing>>;

    /// Every listing, oldest first
    async fn find_all(&self) -> RepositoryResult<Vec<Listing>>;

    /// Listings whose cover has not been uploaded to the CDN, oldest first
    async fn find_without_cover_public_id(
        &self,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Listing>>;

    async fn count_without_cover_public_id(&self) -> RepositoryResult<u64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvertiserStore: Send + Sync {
    async fn insert(&self, advertiser: Advertiser) -> RepositoryResult<Advertiser>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Advertiser>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn exists(&self, listing_id: &str, ip: &str) -> RepositoryResult<bool>;

    /// Record a like; a duplicate pair surfaces as `RepositoryError::UniqueViolation`
    async fn insert(&self, like: Like) -> RepositoryResult<Like>;

    async fn count(&self, listing_id: &str) -> RepositoryResult<u64>;
}
