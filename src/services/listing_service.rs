//! Listing service
//!
//! Business rules for listings: cached paginated queries, the cover image policy, CDN
//! uploads on creation, best-effort CDN cleanup on deletion and cache invalidation on
//! every write.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{ImageCache, ResponseCache};
use crate::cdn::{ImageCdn, ImageUpload, UploadedImage};
use crate::config::ListingsConfig;
use crate::errors::{AppError, AppResult};
use crate::images::{ImageProxy, ImageSource, ImageVariant, RenderedImage};
use crate::models::{
    Listing, ListingCreateRequest, ListingFilter, ListingPage, ListingStatus,
    ListingUpdateRequest, PageRequest,
};
use crate::repositories::ListingStore;

/// Which image of a listing to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Cover,
    Gallery(usize),
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSlot::Cover => write!(f, "cover"),
            ImageSlot::Gallery(index) => write!(f, "images/{index}"),
        }
    }
}

/// Files received with a multipart creation request
#[derive(Debug, Default, Clone)]
pub struct ListingUploads {
    pub cover: Option<ImageUpload>,
    pub gallery: Vec<ImageUpload>,
}

impl ListingUploads {
    pub fn is_empty(&self) -> bool {
        self.cover.is_none() && self.gallery.is_empty()
    }
}

#[derive(Serialize)]
struct ListQuery<'a> {
    operation: &'static str,
    filter: &'a ListingFilter,
    page: u32,
    limit: u32,
}

pub struct ListingService {
    store: Arc<dyn ListingStore>,
    cdn: Arc<dyn ImageCdn>,
    responses: Arc<ResponseCache>,
    image_cache: Arc<ImageCache>,
    image_proxy: Arc<ImageProxy>,
    config: ListingsConfig,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cdn: Arc<dyn ImageCdn>,
        responses: Arc<ResponseCache>,
        image_cache: Arc<ImageCache>,
        image_proxy: Arc<ImageProxy>,
        config: ListingsConfig,
    ) -> Self {
        Self {
            store,
            cdn,
            responses,
            image_cache,
            image_proxy,
            config,
        }
    }

    /// Normalize raw pagination parameters with the configured page sizes
    pub fn page_request(&self, page: Option<i64>, limit: Option<i64>) -> PageRequest {
        PageRequest::normalize(
            page,
            limit,
            self.config.default_page_size,
            self.config.max_page_size,
        )
    }

    fn resolve(&self, listing: Listing) -> Listing {
        listing.with_resolved_cover(&self.config.cover_placeholder)
    }

    /// One page of listings, served from the response cache while fresh
    pub async fn list(&self, filter: &ListingFilter, page: PageRequest) -> AppResult<ListingPage> {
        let key = ResponseCache::list_key(&ListQuery {
            operation: "list",
            filter,
            page: page.page,
            limit: page.limit,
        });

        if let Some(cached) = self.responses.get(&key).await {
            match serde_json::from_value::<ListingPage>(cached) {
                Ok(mut hit) => {
                    debug!(key, "listing page served from cache");
                    hit.from_cache = true;
                    return Ok(hit);
                }
                Err(e) => warn!(key, error = %e, "discarding unreadable cached listing page"),
            }
        }

        let items = self.store.find_page(filter, page).await?;
        let total = self.store.count(filter).await?;
        let items = items.into_iter().map(|l| self.resolve(l)).collect();
        let result = ListingPage::new(items, page, total);

        match serde_json::to_value(&result) {
            Ok(payload) => self.responses.set(key, payload).await,
            Err(e) => warn!(error = %e, "listing page not cached"),
        }
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.store
            .find_by_id(id)
            .await?
            .map(|l| self.resolve(l))
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))
    }

    /// Create a pending listing, uploading any attached files first (cover, then gallery)
    pub async fn create(
        &self,
        draft: ListingCreateRequest,
        uploads: ListingUploads,
    ) -> AppResult<Listing> {
        if draft
            .seller_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
        {
            return Err(AppError::validation("sellerName is required"));
        }

        let has_reference = draft
            .cover_image_url
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
            || draft.images.iter().any(|i| !i.trim().is_empty());
        if self.config.require_cover_on_create && !has_reference && uploads.is_empty() {
            return Err(AppError::validation(
                "At least one image is required: send a cover or gallery images",
            ));
        }

        let mut uploaded: Vec<UploadedImage> = Vec::new();
        let (cover, gallery) = match self.upload_all(uploads, &mut uploaded).await {
            Ok(done) => done,
            Err(e) => {
                self.discard_uploads(&uploaded).await;
                return Err(e);
            }
        };

        let mut listing = draft.into_listing(Uuid::new_v4(), Utc::now());
        if let Some(cover) = cover {
            listing.cover_image_url = Some(cover.url);
            listing.cover_image_public_id = cover.public_id;
        }
        // Public id of images[0] when that image is one of this request's uploads
        let first_image_public_id = if listing.images.is_empty() {
            gallery.first().and_then(|g| g.public_id.clone())
        } else {
            None
        };
        for image in gallery {
            listing.images.push(image.url);
            listing.image_public_ids.extend(image.public_id);
        }

        // A missing cover is backfilled from the first gallery image
        if listing.cover_image_url.is_none() {
            if let Some(first) = listing.images.first().cloned() {
                listing.cover_image_url = Some(first);
                listing.cover_image_public_id = first_image_public_id;
            }
        }
        listing.cover_thumb_url = listing
            .cover_image_public_id
            .as_deref()
            .and_then(|id| self.cdn.thumbnail_url(id));

        let stored = match self.store.insert(listing).await {
            Ok(stored) => stored,
            Err(e) => {
                self.discard_uploads(&uploaded).await;
                return Err(e.into());
            }
        };
        self.responses.invalidate_listings().await;

        info!(id = %stored.id, images = stored.images.len(), "listing created");
        Ok(self.resolve(stored))
    }

    async fn upload_all(
        &self,
        uploads: ListingUploads,
        uploaded: &mut Vec<UploadedImage>,
    ) -> AppResult<(Option<UploadedImage>, Vec<UploadedImage>)> {
        let cover = match uploads.cover {
            Some(file) => {
                let image = self.cdn.upload(file).await?;
                uploaded.push(image.clone());
                Some(image)
            }
            None => None,
        };

        let mut gallery = Vec::with_capacity(uploads.gallery.len());
        for file in uploads.gallery {
            let image = self.cdn.upload(file).await?;
            uploaded.push(image.clone());
            gallery.push(image);
        }
        Ok((cover, gallery))
    }

    async fn discard_uploads(&self, uploaded: &[UploadedImage]) {
        for public_id in uploaded.iter().filter_map(|u| u.public_id.as_deref()) {
            if let Err(e) = self.cdn.delete(public_id).await {
                warn!(public_id, error = %e, "could not remove orphaned upload");
            }
        }
    }

    /// Partial update of a listing
    pub async fn update(&self, id: Uuid, changes: ListingUpdateRequest) -> AppResult<Listing> {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let mut listing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))?;

        let had_image = listing.has_displayable_image();
        let previous_cover = listing.cover_image_url.clone();
        changes.apply_to(&mut listing)?;

        if (had_image || self.config.require_cover_on_create) && !listing.has_displayable_image() {
            return Err(AppError::validation(
                "A listing must keep at least one image",
            ));
        }

        if listing.cover_image_url != previous_cover {
            // The CDN asset of a replaced cover still belongs to the listing for cleanup
            if let Some(old_id) = listing.cover_image_public_id.take() {
                if !listing.image_public_ids.contains(&old_id) {
                    listing.image_public_ids.push(old_id);
                }
            }
            listing.cover_thumb_url = None;
        }

        let updated = self
            .store
            .update(listing)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))?;
        self.invalidate(id).await;

        info!(%id, "listing updated");
        Ok(self.resolve(updated))
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> AppResult<Listing> {
        let status = ListingStatus::parse(status)?;
        let updated = self
            .store
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))?;
        self.invalidate(id).await;

        info!(%id, %status, "listing status changed");
        Ok(self.resolve(updated))
    }

    /// Delete a listing and then, best effort, every CDN asset it owned
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))?;
        self.invalidate(id).await;

        let public_ids = removed.public_ids();
        let mut failures = 0usize;
        for public_id in &public_ids {
            if let Err(e) = self.cdn.delete(public_id).await {
                failures += 1;
                warn!(%id, public_id, error = %e, "failed to delete listing image from CDN");
            }
        }

        info!(%id, assets = public_ids.len(), failures, "listing deleted");
        Ok(())
    }

    /// Render one of a listing's images
    pub async fn image(
        &self,
        id: Uuid,
        slot: ImageSlot,
        variant: &ImageVariant,
    ) -> AppResult<RenderedImage> {
        let listing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))?;

        let reference = match slot {
            ImageSlot::Cover => listing
                .stored_cover()
                .unwrap_or(&self.config.cover_placeholder)
                .to_string(),
            ImageSlot::Gallery(index) => listing
                .images
                .get(index)
                .filter(|image| !image.trim().is_empty())
                .cloned()
                .ok_or_else(|| AppError::not_found("Listing image", format!("{id}/{index}")))?,
        };

        let source = ImageSource::parse(&reference)?;
        self.image_proxy
            .render(&format!("{id}/{slot}"), &source, variant)
            .await
    }

    async fn invalidate(&self, id: Uuid) {
        self.responses.invalidate_listings().await;
        self.image_cache.invalidate_listing(&id).await;
    }
}
