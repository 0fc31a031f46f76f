//! Advertiser registration

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Advertiser, AdvertiserCreateRequest};
use crate::repositories::AdvertiserStore;

pub struct AdvertiserService {
    store: Arc<dyn AdvertiserStore>,
}

impl AdvertiserService {
    pub fn new(store: Arc<dyn AdvertiserStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: AdvertiserCreateRequest) -> AppResult<Advertiser> {
        // Argon2 hashing is CPU-bound
        let advertiser =
            tokio::task::spawn_blocking(move || request.into_advertiser(Uuid::new_v4(), Utc::now()))
                .await
                .map_err(|e| AppError::internal(format!("credential hashing task failed: {e}")))??;
        let stored = self.store.insert(advertiser).await?;
        info!(id = %stored.id, "advertiser registered");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::traits::MockAdvertiserStore;

    #[tokio::test]
    async fn test_invalid_request_never_reaches_store() {
        let mut store = MockAdvertiserStore::new();
        store.expect_insert().never();
        let service = AdvertiserService::new(Arc::new(store));

        let err = service
            .register(AdvertiserCreateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_register_stores_hashed_credential() {
        let mut store = MockAdvertiserStore::new();
        store
            .expect_insert()
            .withf(|a| a.password_hash.starts_with("$argon2id$"))
            .times(1)
            .returning(Ok);
        let service = AdvertiserService::new(Arc::new(store));

        let advertiser = service
            .register(AdvertiserCreateRequest {
                name: Some("Ônibus & Cia".to_string()),
                phone: Some("31 3333-3333".to_string()),
                email: Some("oi@onibus.com".to_string()),
                password: Some("abc123".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(advertiser.name, "Ônibus & Cia");
    }
}
