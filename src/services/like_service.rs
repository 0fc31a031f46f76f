//! Like counters with one like per listing and IP

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, RepositoryError};
use crate::models::{Like, LikeCount, LikeReceipt};
use crate::repositories::LikeStore;

pub struct LikeService {
    store: Arc<dyn LikeStore>,
}

fn required<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value)
}

impl LikeService {
    pub fn new(store: Arc<dyn LikeStore>) -> Self {
        Self { store }
    }

    /// Record a like from `ip`; a second like from the same IP is a conflict
    pub async fn submit(&self, listing_id: &str, ip: &str) -> AppResult<LikeReceipt> {
        let listing_id = required("listingId", listing_id)?;
        let ip = required("ip", ip)?;

        if self.store.exists(listing_id, ip).await? {
            return Err(AppError::conflict("You have already liked this listing"));
        }

        let like = Like {
            id: Uuid::new_v4(),
            listing_id: listing_id.to_string(),
            ip: ip.to_string(),
            created_at: Utc::now(),
        };
        match self.store.insert(like).await {
            Ok(_) => {}
            // Lost a race with a concurrent like from the same IP
            Err(RepositoryError::UniqueViolation { .. }) => {
                return Err(AppError::conflict("You have already liked this listing"));
            }
            Err(e) => return Err(e.into()),
        }

        let total = self.store.count(listing_id).await?;
        debug!(listing_id, total, "like recorded");
        Ok(LikeReceipt {
            success: true,
            total,
        })
    }

    pub async fn count(&self, listing_id: &str) -> AppResult<LikeCount> {
        let listing_id = required("listingId", listing_id)?;
        Ok(LikeCount {
            total: self.store.count(listing_id).await?,
        })
    }
}
