//! SeaORM-based advertiser repository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::traits::AdvertiserStore;
use crate::entities::{advertisers, prelude::Advertisers};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{Advertiser, Location};

#[derive(Clone)]
pub struct AdvertiserSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl AdvertiserSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    fn model_to_domain(model: advertisers::Model) -> Advertiser {
        Advertiser {
            id: model.id,
            name: model.name,
            phone: model.phone,
            email: model.email,
            document: model.document,
            address: model.address,
            location: Location {
                city: model.city,
                state: model.state,
            },
            password_hash: model.password_hash,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl AdvertiserStore for AdvertiserSeaOrmRepository {
    async fn insert(&self, advertiser: Advertiser) -> RepositoryResult<Advertiser> {
        let active_model = advertisers::ActiveModel {
            id: Set(advertiser.id),
            name: Set(advertiser.name),
            phone: Set(advertiser.phone),
            email: Set(advertiser.email),
            document: Set(advertiser.document),
            address: Set(advertiser.address),
            city: Set(advertiser.location.city),
            state: Set(advertiser.location.state),
            password_hash: Set(advertiser.password_hash),
            created_at: Set(advertiser.created_at),
            updated_at: Set(advertiser.updated_at),
        };

        let model = active_model
            .insert(&*self.connection)
            .await
            .map_err(|e| RepositoryError::from_insert_error(e, "advertisers_pkey"))?;
        Ok(Self::model_to_domain(model))
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Advertiser>> {
        Ok(Advertisers::find_by_id(id)
            .one(&*self.connection)
            .await?
            .map(Self::model_to_domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::AdvertiserCreateRequest;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_keeps_credential_hash() {
        let database = Database::in_memory().await.unwrap();
        let repo = AdvertiserSeaOrmRepository::new(database.connection());

        let advertiser = AdvertiserCreateRequest {
            name: Some("Rodoviária Norte".to_string()),
            phone: Some("11 4000-0000".to_string()),
            email: Some("vendas@norte.com".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        }
        .into_advertiser(Uuid::new_v4(), Utc::now())
        .unwrap();

        repo.insert(advertiser.clone()).await.unwrap();
        let found = repo.find_by_id(advertiser.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, advertiser.password_hash);
        assert_eq!(found.email, "vendas@norte.com");
    }
}
