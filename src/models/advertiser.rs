use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use uuid::Uuid;

use super::listing::Location;
use crate::errors::{AppError, AppResult};

/// A registered seller account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertiser {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub document: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub location: Location,
    /// Salted digest of the credential, never sent to clients
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvertiserCreateRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub document: Option<String>,
    pub address: Option<String>,
    pub location: Location,
    pub password: Option<String>,
}

fn required(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

impl AdvertiserCreateRequest {
    pub fn into_advertiser(self, id: Uuid, now: DateTime<Utc>) -> AppResult<Advertiser> {
        let name = required("name", self.name)?;
        let phone = required("phone", self.phone)?;
        let email = required("email", self.email)?;
        if !email.contains('@') {
            return Err(AppError::validation(format!("Invalid email '{email}'")));
        }
        let password = required("password", self.password)?;

        Ok(Advertiser {
            id,
            name,
            phone,
            email,
            document: self.document.filter(|d| !d.trim().is_empty()),
            address: self.address.filter(|a| !a.trim().is_empty()),
            location: self.location,
            password_hash: hash_password(&password)?,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Argon2id digest of `password` in PHC string form
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AdvertiserCreateRequest {
        AdvertiserCreateRequest {
            name: Some("Transportes Sul".to_string()),
            phone: Some("+55 41 99999-0000".to_string()),
            email: Some("contato@sul.com.br".to_string()),
            password: Some("segredo".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_credential_is_hashed_and_not_serialized() {
        let advertiser = request().into_advertiser(Uuid::new_v4(), Utc::now()).unwrap();
        assert!(advertiser.password_hash.starts_with("$argon2id$"));
        assert!(!advertiser.password_hash.contains("segredo"));

        let json = serde_json::to_value(&advertiser).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "Transportes Sul");
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        for strip in ["name", "phone", "email", "password"] {
            let mut req = request();
            match strip {
                "name" => req.name = None,
                "phone" => req.phone = Some("  ".to_string()),
                "email" => req.email = None,
                _ => req.password = None,
            }
            let err = req.into_advertiser(Uuid::new_v4(), Utc::now()).unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "{strip}");
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};

        let first = hash_password("segredo").unwrap();
        let second = hash_password("segredo").unwrap();
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(Argon2::default()
            .verify_password(b"segredo", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"outro", &parsed)
            .is_err());
    }
}
