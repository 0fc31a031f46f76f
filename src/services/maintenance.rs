//! Offline maintenance jobs run from the command line

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cdn::{ImageCdn, UploadedImage};
use crate::errors::{AppError, AppResult};
use crate::models::Listing;
use crate::repositories::ListingStore;

/// Outcome of an image migration run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub migrated: u64,
    pub skipped: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    /// Report what would be uploaded without touching the CDN or the store
    pub dry_run: bool,
    pub limit: Option<u64>,
}

pub struct MaintenanceService {
    store: Arc<dyn ListingStore>,
    cdn: Arc<dyn ImageCdn>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn ListingStore>, cdn: Arc<dyn ImageCdn>) -> Self {
        Self { store, cdn }
    }

    /// Write every listing to `<out_dir>/Listings_<timestamp>.json`
    pub async fn backup(&self, out_dir: &Path) -> AppResult<(PathBuf, usize)> {
        let listings = self.store.find_all().await?;

        tokio::fs::create_dir_all(out_dir).await.map_err(|e| {
            AppError::internal(format!("cannot create {}: {e}", out_dir.display()))
        })?;

        let stamp = Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let path = out_dir.join(format!("Listings_{stamp}.json"));

        let json = serde_json::to_vec_pretty(&listings)
            .map_err(|e| AppError::internal(format!("cannot serialize listings: {e}")))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::internal(format!("cannot write {}: {e}", path.display())))?;

        info!(count = listings.len(), path = %path.display(), "listings backed up");
        Ok((path, listings.len()))
    }

    /// Listings whose cover has not been uploaded to the CDN yet
    pub async fn count_unmigrated(&self) -> AppResult<u64> {
        Ok(self.store.count_without_cover_public_id().await?)
    }

    /// Move the images of not-yet-migrated listings to the CDN, oldest first.
    ///
    /// Runs outside the server process, so cached list pages expire on their TTL.
    pub async fn migrate_images(&self, options: MigrationOptions) -> AppResult<MigrationSummary> {
        let pending = self
            .store
            .find_without_cover_public_id(options.limit.filter(|l| *l > 0))
            .await?;
        info!(
            count = pending.len(),
            dry_run = options.dry_run,
            cdn = self.cdn.name(),
            "migrating listing images"
        );

        let mut summary = MigrationSummary::default();
        for listing in pending {
            let id = listing.id;
            if listing.stored_cover().is_none() {
                warn!(%id, "listing has no image to use as cover, skipping");
                summary.skipped += 1;
                continue;
            }

            if options.dry_run {
                info!(%id, "would migrate listing images");
                summary.migrated += 1;
                continue;
            }

            match self.migrate_listing(listing).await {
                Ok(()) => {
                    info!(%id, "listing images migrated");
                    summary.migrated += 1;
                }
                Err(e) => {
                    warn!(%id, error = %e, "listing image migration failed");
                    summary.errors += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn migrate_listing(&self, mut listing: Listing) -> AppResult<()> {
        let cover_source = listing
            .stored_cover()
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("listing has no image"))?;

        let cover = if self.cdn.is_hosted(&cover_source) {
            UploadedImage {
                url: cover_source,
                public_id: listing.cover_image_public_id.clone(),
            }
        } else {
            self.cdn.upload_reference(&cover_source).await?
        };

        let mut images = Vec::with_capacity(listing.images.len());
        for image in &listing.images {
            if self.cdn.is_hosted(image) {
                images.push(image.clone());
                continue;
            }
            let uploaded = self.cdn.upload_reference(image).await?;
            images.push(uploaded.url);
            if let Some(public_id) = uploaded.public_id {
                if !listing.image_public_ids.contains(&public_id) {
                    listing.image_public_ids.push(public_id);
                }
            }
        }

        listing.cover_thumb_url = cover
            .public_id
            .as_deref()
            .and_then(|id| self.cdn.thumbnail_url(id))
            .or(listing.cover_thumb_url);
        listing.cover_image_url = Some(cover.url);
        listing.cover_image_public_id = cover.public_id;
        listing.images = images;

        let id = listing.id;
        self.store
            .update(listing)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Listing", id.to_string()))
    }
}
