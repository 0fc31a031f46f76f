//! SeaORM-based like repository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use std::sync::Arc;

use super::traits::LikeStore;
use crate::entities::{likes, prelude::Likes};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::Like;

pub const LIKE_UNIQUE_INDEX: &str = "idx_likes_listing_id_ip";

#[derive(Clone)]
pub struct LikeSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl LikeSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl LikeStore for LikeSeaOrmRepository {
    async fn exists(&self, listing_id: &str, ip: &str) -> RepositoryResult<bool> {
        let matches = Likes::find()
            .filter(likes::Column::ListingId.eq(listing_id))
            .filter(likes::Column::Ip.eq(ip))
            .count(&*self.connection)
            .await?;
        Ok(matches > 0)
    }

    async fn insert(&self, like: Like) -> RepositoryResult<Like> {
        let active_model = likes::ActiveModel {
            id: Set(like.id),
            listing_id: Set(like.listing_id.clone()),
            ip: Set(like.ip.clone()),
            created_at: Set(like.created_at),
        };
        active_model
            .insert(&*self.connection)
            .await
            .map_err(|e| RepositoryError::from_insert_error(e, LIKE_UNIQUE_INDEX))?;
        Ok(like)
    }

    async fn count(&self, listing_id: &str) -> RepositoryResult<u64> {
        Ok(Likes::find()
            .filter(likes::Column::ListingId.eq(listing_id))
            .count(&*self.connection)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use chrono::Utc;
    use uuid::Uuid;

    fn like(listing_id: &str, ip: &str) -> Like {
        Like {
            id: Uuid::new_v4(),
            listing_id: listing_id.to_string(),
            ip: ip.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_pair() {
        let database = Database::in_memory().await.unwrap();
        let repo = LikeSeaOrmRepository::new(database.connection());

        repo.insert(like("listing-1", "10.0.0.1")).await.unwrap();
        repo.insert(like("listing-1", "10.0.0.2")).await.unwrap();
        repo.insert(like("listing-2", "10.0.0.1")).await.unwrap();

        let err = repo.insert(like("listing-1", "10.0.0.1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation { .. }));

        assert!(repo.exists("listing-1", "10.0.0.1").await.unwrap());
        assert!(!repo.exists("listing-3", "10.0.0.1").await.unwrap());
        assert_eq!(repo.count("listing-1").await.unwrap(), 2);
    }
}
