//! SeaORM-based listing repository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::traits::ListingStore;
use crate::entities::{listings, prelude::Listings};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Listing, ListingFilter, ListingStatus, Location, PageRequest};

const TABLE: &str = "listings";

#[derive(Clone)]
pub struct ListingSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl ListingSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn filter_condition(filter: &ListingFilter) -> Condition {
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(listings::Column::Status.eq(status.to_string()));
        }
        if let Some(category) = &filter.category {
            condition = condition.add(listings::Column::Category.eq(category.as_str()));
        }
        if let Some(city) = &filter.city {
            condition = condition.add(listings::Column::City.eq(city.as_str()));
        }
        if let Some(state) = &filter.state {
            condition = condition.add(listings::Column::State.eq(state.as_str()));
        }
        if let Some(advertiser_id) = filter.advertiser_id {
            condition = condition.add(listings::Column::AdvertiserId.eq(advertiser_id));
        }
        condition
    }

    /// Blank strings count as "no cover public id" alongside NULL
    fn missing_cover_public_id() -> Condition {
        Condition::any()
            .add(listings::Column::CoverImagePublicId.is_null())
            .add(listings::Column::CoverImagePublicId.eq(""))
    }

    fn domain_to_active(listing: &Listing) -> RepositoryResult<listings::ActiveModel> {
        Ok(listings::ActiveModel {
            id: Set(listing.id),
            seller_name: Set(listing.seller_name.clone()),
            seller_contact: Set(listing.seller_contact.clone()),
            email: Set(listing.email.clone()),
            phone: Set(listing.phone.clone()),
            phone_raw: Set(listing.phone_raw.clone()),
            category: Set(listing.category.clone()),
            body_manufacturer: Set(listing.body_manufacturer.clone()),
            body_model: Set(listing.body_model.clone()),
            chassis_manufacturer: Set(listing.chassis_manufacturer.clone()),
            chassis_model: Set(listing.chassis_model.clone()),
            mileage: Set(listing.mileage.clone()),
            seats: Set(listing.seats.clone()),
            color: Set(listing.color.clone()),
            model_year: Set(listing.model_year.clone()),
            price: Set(listing.price),
            description: Set(listing.description.clone()),
            cover_image_url: Set(listing.cover_image_url.clone()),
            cover_image_public_id: Set(listing.cover_image_public_id.clone()),
            cover_thumb_url: Set(listing.cover_thumb_url.clone()),
            images: Set(serde_json::to_string(&listing.images)?),
            image_public_ids: Set(serde_json::to_string(&listing.image_public_ids)?),
            city: Set(listing.location.city.clone()),
            state: Set(listing.location.state.clone()),
            status: Set(listing.status.to_string()),
            advertiser_id: Set(listing.advertiser_id),
            submitted_at: Set(listing.submitted_at.clone()),
            created_at: Set(listing.created_at),
            updated_at: Set(Utc::now()),
        })
    }

    fn model_to_domain(model: listings::Model) -> RepositoryResult<Listing> {
        let status = ListingStatus::from_str(&model.status).map_err(|_| {
            RepositoryError::corrupt(TABLE, model.id, format!("unknown status '{}'", model.status))
        })?;
        let images: Vec<String> = serde_json::from_str(&model.images).map_err(|e| {
            RepositoryError::corrupt(TABLE, model.id, format!("images column: {e}"))
        })?;
        let image_public_ids: Vec<String> =
            serde_json::from_str(&model.image_public_ids).map_err(|e| {
                RepositoryError::corrupt(TABLE, model.id, format!("image_public_ids column: {e}"))
            })?;

        Ok(Listing {
            id: model.id,
            seller_name: model.seller_name,
            seller_contact: model.seller_contact,
            email: model.email,
            phone: model.phone,
            phone_raw: model.phone_raw,
            category: model.category,
            body_manufacturer: model.body_manufacturer,
            body_model: model.body_model,
            chassis_manufacturer: model.chassis_manufacturer,
            chassis_model: model.chassis_model,
            mileage: model.mileage,
            seats: model.seats,
            color: model.color,
            model_year: model.model_year,
            price: model.price,
            description: model.description,
            cover_image_url: model.cover_image_url,
            cover_image_public_id: model.cover_image_public_id,
            cover_thumb_url: model.cover_thumb_url,
            images,
            image_public_ids,
            location: Location {
                city: model.city,
                state: model.state,
            },
            status,
            advertiser_id: model.advertiser_id,
            submitted_at: model.submitted_at,
            created_at: model.created_at,
        })
    }

    fn models_to_domain(models: Vec<listings::Model>) -> RepositoryResult<Vec<Listing>> {
        models.into_iter().map(Self::model_to_domain).collect()
    }
}

#[async_trait]
impl ListingStore for ListingSeaOrmRepository {
    async fn find_page(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> RepositoryResult<Vec<Listing>> {
        let models = Listings::find()
            .filter(Self::filter_condition(filter))
            .order_by_desc(listings::Column::CreatedAt)
            .order_by_desc(listings::Column::Id)
            .offset(page.offset())
            .limit(u64::from(page.limit))
            .all(&*self.connection)
            .await?;
        Self::models_to_domain(models)
    }

    async fn count(&self, filter: &ListingFilter) -> RepositoryResult<u64> {
        Ok(Listings::find()
            .filter(Self::filter_condition(filter))
            .count(&*self.connection)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        Listings::find_by_id(id)
            .one(&*self.connection)
            .await?
            .map(Self::model_to_domain)
            .transpose()
    }

    async fn insert(&self, listing: Listing) -> RepositoryResult<Listing> {
        let model = Self::domain_to_active(&listing)?
            .insert(&*self.connection)
            .await
            .map_err(|e| RepositoryError::from_insert_error(e, "listings_pkey"))?;
        Self::model_to_domain(model)
    }

    async fn update(&self, listing: Listing) -> RepositoryResult<Option<Listing>> {
        if Listings::find_by_id(listing.id)
            .one(&*self.connection)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let model = Self::domain_to_active(&listing)?
            .update(&*self.connection)
            .await?;
        Self::model_to_domain(model).map(Some)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> RepositoryResult<Option<Listing>> {
        let Some(existing) = Listings::find_by_id(id).one(&*self.connection).await? else {
            return Ok(None);
        };

        let mut active_model: listings::ActiveModel = existing.into();
        active_model.status = Set(status.to_string());
        active_model.updated_at = Set(Utc::now());
        let model = active_model.update(&*self.connection).await?;
        Self::model_to_domain(model).map(Some)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        let Some(existing) = Listings::find_by_id(id).one(&*self.connection).await? else {
            return Ok(None);
        };
        let listing = Self::model_to_domain(existing)?;

        Listings::delete_by_id(id).exec(&*self.connection).await?;
        Ok(Some(listing))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Listing>> {
        let models = Listings::find()
            .order_by_asc(listings::Column::CreatedAt)
            .order_by_asc(listings::Column::Id)
            .all(&*self.connection)
            .await?;
        Self::models_to_domain(models)
    }

    async fn find_without_cover_public_id(
        &self,
        limit: Option<u64>,
    ) -> RepositoryResult<Vec<Listing>> {
        let models = Listings::find()
            .filter(Self::missing_cover_public_id())
            .order_by_asc(listings::Column::CreatedAt)
            .order_by_asc(listings::Column::Id)
            .limit(limit)
            .all(&*self.connection)
            .await?;
        Self::models_to_domain(models)
    }

    async fn count_without_cover_public_id(&self) -> RepositoryResult<u64> {
        Ok(Listings::find()
            .filter(Self::missing_cover_public_id())
            .count(&*self.connection)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::ListingCreateRequest;
    use chrono::{Duration, TimeZone};

    async fn repository() -> ListingSeaOrmRepository {
        let database = Database::in_memory().await.unwrap();
        ListingSeaOrmRepository::new(database.connection())
    }

    fn listing(name: &str, city: &str, minutes: i64) -> Listing {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
            + Duration::minutes(minutes);
        ListingCreateRequest {
            seller_name: Some(name.to_string()),
            images: vec![format!("https://img.example/{name}.jpg")],
            location: Location {
                city: Some(city.to_string()),
                state: Some("SP".to_string()),
            },
            ..Default::default()
        }
        .into_listing(Uuid::new_v4(), created_at)
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip_lists() {
        let repo = repository().await;
        let mut original = listing("a", "Campinas", 0);
        original.image_public_ids = vec!["webbuses/a".to_string()];

        repo.insert(original.clone()).await.unwrap();
        let found = repo.find_by_id(original.id).await.unwrap().unwrap();

        assert_eq!(found.images, original.images);
        assert_eq!(found.image_public_ids, original.image_public_ids);
        assert_eq!(found.location, original.location);
        assert_eq!(found.status, ListingStatus::Pending);
    }

    #[tokio::test]
    async fn test_find_page_is_newest_first_and_filtered() {
        let repo = repository().await;
        for (i, city) in ["Campinas", "Santos", "Campinas", "Campinas"].iter().enumerate() {
            repo.insert(listing(&format!("l{i}"), city, i as i64)).await.unwrap();
        }

        let filter = ListingFilter {
            city: Some("Campinas".to_string()),
            ..Default::default()
        };
        let first_page = repo
            .find_page(&filter, PageRequest { page: 1, limit: 2 })
            .await
            .unwrap();
        let names: Vec<_> = first_page.iter().map(|l| l.seller_name.as_str()).collect();
        assert_eq!(names, vec!["l3", "l2"]);

        let second_page = repo
            .find_page(&filter, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].seller_name, "l0");

        assert_eq!(repo.count(&filter).await.unwrap(), 3);
        assert_eq!(repo.count(&ListingFilter::default()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_status_update_and_status_filter() {
        let repo = repository().await;
        let stored = repo.insert(listing("a", "Campinas", 0)).await.unwrap();
        repo.insert(listing("b", "Campinas", 1)).await.unwrap();

        let updated = repo
            .update_status(stored.id, ListingStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ListingStatus::Approved);

        let approved = ListingFilter {
            status: Some(ListingStatus::Approved),
            ..Default::default()
        };
        assert_eq!(repo.count(&approved).await.unwrap(), 1);
        assert!(repo
            .update_status(Uuid::new_v4(), ListingStatus::Rejected)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_listing() {
        let repo = repository().await;
        let stored = repo.insert(listing("a", "Campinas", 0)).await.unwrap();

        let removed = repo.delete(stored.id).await.unwrap();
        assert_eq!(removed.map(|l| l.id), Some(stored.id));
        assert!(repo.find_by_id(stored.id).await.unwrap().is_none());
        assert!(repo.delete(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_cover_public_id_queries() {
        let repo = repository().await;
        let mut migrated = listing("done", "Campinas", 0);
        migrated.cover_image_public_id = Some("webbuses/done".to_string());
        repo.insert(migrated).await.unwrap();
        repo.insert(listing("old", "Campinas", 1)).await.unwrap();
        repo.insert(listing("new", "Campinas", 2)).await.unwrap();

        assert_eq!(repo.count_without_cover_public_id().await.unwrap(), 2);
        let pending = repo.find_without_cover_public_id(Some(1)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].seller_name, "old");
    }
}
