//! Vehicle listing model, query types and the cover image fallback rule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Moderation lifecycle of a listing
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    /// Parse a client supplied status, reporting a validation error on junk
    pub fn parse(value: &str) -> AppResult<Self> {
        Self::from_str(value.trim()).map_err(|_| {
            AppError::validation(format!(
                "Invalid status '{value}': expected pending, approved or rejected"
            ))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub seller_name: String,
    /// Click-to-chat link for the seller
    pub seller_contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_raw: Option<String>,

    pub category: Option<String>,
    pub body_manufacturer: Option<String>,
    pub body_model: Option<String>,
    pub chassis_manufacturer: Option<String>,
    pub chassis_model: Option<String>,
    pub mileage: Option<String>,
    pub seats: Option<String>,
    pub color: Option<String>,
    pub model_year: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,

    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub cover_thumb_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_public_ids: Vec<String>,

    #[serde(default)]
    pub location: Location,
    pub status: ListingStatus,
    pub advertiser_id: Option<Uuid>,
    /// Client supplied submission date, kept verbatim
    pub submitted_at: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// First candidate that holds a non-blank value
pub fn first_present<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl Listing {
    /// Cover image actually stored for this listing: the explicit cover, else the first
    /// gallery image
    pub fn stored_cover(&self) -> Option<&str> {
        first_present([
            self.cover_image_url.as_deref(),
            self.images.first().map(String::as_str),
        ])
    }

    /// Whether at least one image can be displayed for this listing
    pub fn has_displayable_image(&self) -> bool {
        self.stored_cover().is_some() || self.images.iter().any(|i| !i.trim().is_empty())
    }

    /// Fill `cover_image_url` following cover -> first gallery image -> placeholder
    pub fn with_resolved_cover(mut self, placeholder: &str) -> Self {
        let cover = self.stored_cover().unwrap_or(placeholder).to_string();
        self.cover_image_url = Some(cover);
        self
    }

    /// Every CDN public id owned by this listing
    pub fn public_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cover_image_public_id.iter().cloned().collect();
        for id in &self.image_public_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

/// Body of a JSON listing creation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingCreateRequest {
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_raw: Option<String>,
    pub category: Option<String>,
    pub body_manufacturer: Option<String>,
    pub body_model: Option<String>,
    pub chassis_manufacturer: Option<String>,
    pub chassis_model: Option<String>,
    pub mileage: Option<String>,
    pub seats: Option<String>,
    pub color: Option<String>,
    pub model_year: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub images: Vec<String>,
    pub location: Location,
    pub advertiser_id: Option<Uuid>,
    pub submitted_at: Option<String>,
}

impl ListingCreateRequest {
    /// Set a scalar field from a multipart text part; unknown names are ignored
    pub fn set_text_field(&mut self, name: &str, value: String) -> AppResult<()> {
        let value = Some(value).filter(|v| !v.trim().is_empty());
        match name {
            "sellerName" => self.seller_name = value,
            "sellerContact" => self.seller_contact = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            "phoneRaw" => self.phone_raw = value,
            "category" => self.category = value,
            "bodyManufacturer" => self.body_manufacturer = value,
            "bodyModel" => self.body_model = value,
            "chassisManufacturer" => self.chassis_manufacturer = value,
            "chassisModel" => self.chassis_model = value,
            "mileage" => self.mileage = value,
            "seats" => self.seats = value,
            "color" => self.color = value,
            "modelYear" => self.model_year = value,
            "description" => self.description = value,
            "coverImageUrl" => self.cover_image_url = value,
            "submittedAt" => self.submitted_at = value,
            "city" | "location[city]" => self.location.city = value,
            "state" | "location[state]" => self.location.state = value,
            "images" | "images[]" => self.images.extend(value),
            "price" => {
                self.price = value
                    .map(|v| parse_price(&v))
                    .transpose()?;
            }
            "advertiserId" => {
                self.advertiser_id = value
                    .map(|v| {
                        Uuid::parse_str(v.trim())
                            .map_err(|_| AppError::validation(format!("Invalid advertiserId '{v}'")))
                    })
                    .transpose()?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Build a pending listing; image references must already be resolved
    pub fn into_listing(self, id: Uuid, created_at: DateTime<Utc>) -> Listing {
        Listing {
            id,
            seller_name: self.seller_name.unwrap_or_default().trim().to_string(),
            seller_contact: self.seller_contact,
            email: self.email,
            phone: self.phone,
            phone_raw: self.phone_raw,
            category: self.category,
            body_manufacturer: self.body_manufacturer,
            body_model: self.body_model,
            chassis_manufacturer: self.chassis_manufacturer,
            chassis_model: self.chassis_model,
            mileage: self.mileage,
            seats: self.seats,
            color: self.color,
            model_year: self.model_year,
            price: self.price,
            description: self.description,
            cover_image_url: self.cover_image_url.filter(|c| !c.trim().is_empty()),
            cover_image_public_id: None,
            cover_thumb_url: None,
            images: self
                .images
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            image_public_ids: Vec::new(),
            location: self.location,
            status: ListingStatus::Pending,
            advertiser_id: self.advertiser_id,
            submitted_at: self.submitted_at,
            created_at,
        }
    }
}

/// Accepts "185000", "185000.50" and the comma decimal form "185000,50"
fn parse_price(value: &str) -> AppResult<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| AppError::validation(format!("Invalid price '{value}'")))
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingUpdateRequest {
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_raw: Option<String>,
    pub category: Option<String>,
    pub body_manufacturer: Option<String>,
    pub body_model: Option<String>,
    pub chassis_manufacturer: Option<String>,
    pub chassis_model: Option<String>,
    pub mileage: Option<String>,
    pub seats: Option<String>,
    pub color: Option<String>,
    pub model_year: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub location: Option<Location>,
    pub status: Option<String>,
    pub advertiser_id: Option<Uuid>,
}

impl ListingUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the present fields onto `listing`
    pub fn apply_to(self, listing: &mut Listing) -> AppResult<()> {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        if let Some(status) = self.status.as_deref() {
            listing.status = ListingStatus::parse(status)?;
        }
        if let Some(name) = self.seller_name {
            if name.trim().is_empty() {
                return Err(AppError::validation("sellerName cannot be blank"));
            }
            listing.seller_name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::validation(format!("Invalid price '{price}'")));
            }
            listing.price = Some(price);
        }

        set(&mut listing.seller_contact, self.seller_contact);
        set(&mut listing.email, self.email);
        set(&mut listing.phone, self.phone);
        set(&mut listing.phone_raw, self.phone_raw);
        set(&mut listing.category, self.category);
        set(&mut listing.body_manufacturer, self.body_manufacturer);
        set(&mut listing.body_model, self.body_model);
        set(&mut listing.chassis_manufacturer, self.chassis_manufacturer);
        set(&mut listing.chassis_model, self.chassis_model);
        set(&mut listing.mileage, self.mileage);
        set(&mut listing.seats, self.seats);
        set(&mut listing.color, self.color);
        set(&mut listing.model_year, self.model_year);
        set(&mut listing.description, self.description);
        set(&mut listing.advertiser_id, self.advertiser_id);

        if let Some(cover) = self.cover_image_url {
            // A blank cover clears the explicit cover and lets the gallery take over
            listing.cover_image_url = Some(cover).filter(|c| !c.trim().is_empty());
        }
        if let Some(images) = self.images {
            listing.images = images.into_iter().filter(|i| !i.trim().is_empty()).collect();
        }
        if let Some(location) = self.location {
            listing.location = location;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Exact-match filters for listing queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub advertiser_id: Option<Uuid>,
}

/// Normalized pagination request: page >= 1 and 1 <= limit <= max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn normalize(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let page = page
            .filter(|p| *p >= 1)
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
            .unwrap_or(1);
        let limit = match limit {
            Some(l) if l >= 1 => u32::try_from(l).unwrap_or(u32::MAX).min(max_limit),
            _ => default_limit.min(max_limit),
        };
        Self { page, limit }
    }

    /// Zero-based row offset
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// ceil(total / limit), never less than one
    pub fn total_pages(&self, total: u64) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        let pages = total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}

/// Paginated listing response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    #[serde(default)]
    pub from_cache: bool,
}

impl ListingPage {
    pub fn new(items: Vec<Listing>, page: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            current_page: page.page,
            total_pages: page.total_pages(total_items),
            total_items,
            from_cache: false,
        }
    }
}
