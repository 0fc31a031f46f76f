use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub seller_name: String,
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
    #[sea_orm(column_type = "Double", nullable)]
    pub price: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub cover_thumb_url: Option<String>,
    /// JSON array of image references
    #[sea_orm(column_type = "Text")]
    pub images: String,
    /// JSON array of CDN public ids
    #[sea_orm(column_type = "Text")]
    pub image_public_ids: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: String,
    pub advertiser_id: Option<Uuid>,
    pub submitted_at: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
