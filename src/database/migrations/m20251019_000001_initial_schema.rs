use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_listings_table(manager).await?;
        self.create_advertisers_table(manager).await?;
        self.create_likes_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Advertisers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Listings::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    fn create_id_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    fn create_nullable_uuid_column(
        &self,
        manager: &SchemaManager,
        column: impl IntoIden,
    ) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.uuid(),
            _ => col.string(),
        };
        col
    }

    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    async fn create_listings_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Listings::Id).primary_key())
                    .col(ColumnDef::new(Listings::SellerName).string().not_null())
                    .col(ColumnDef::new(Listings::SellerContact).string())
                    .col(ColumnDef::new(Listings::Email).string())
                    .col(ColumnDef::new(Listings::Phone).string())
                    .col(ColumnDef::new(Listings::PhoneRaw).string())
                    .col(ColumnDef::new(Listings::Category).string())
                    .col(ColumnDef::new(Listings::BodyManufacturer).string())
                    .col(ColumnDef::new(Listings::BodyModel).string())
                    .col(ColumnDef::new(Listings::ChassisManufacturer).string())
                    .col(ColumnDef::new(Listings::ChassisModel).string())
                    .col(ColumnDef::new(Listings::Mileage).string())
                    .col(ColumnDef::new(Listings::Seats).string())
                    .col(ColumnDef::new(Listings::Color).string())
                    .col(ColumnDef::new(Listings::ModelYear).string())
                    .col(ColumnDef::new(Listings::Price).double())
                    .col(ColumnDef::new(Listings::Description).text())
                    .col(ColumnDef::new(Listings::CoverImageUrl).text())
                    .col(ColumnDef::new(Listings::CoverImagePublicId).string())
                    .col(ColumnDef::new(Listings::CoverThumbUrl).text())
                    .col(ColumnDef::new(Listings::Images).text().not_null())
                    .col(ColumnDef::new(Listings::ImagePublicIds).text().not_null())
                    .col(ColumnDef::new(Listings::City).string())
                    .col(ColumnDef::new(Listings::State).string())
                    .col(
                        ColumnDef::new(Listings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(self.create_nullable_uuid_column(manager, Listings::AdvertiserId))
                    .col(ColumnDef::new(Listings::SubmittedAt).string())
                    .col(self.create_timestamp_column(manager, Listings::CreatedAt))
                    .col(self.create_timestamp_column(manager, Listings::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_advertisers_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Advertisers::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Advertisers::Id).primary_key())
                    .col(ColumnDef::new(Advertisers::Name).string().not_null())
                    .col(ColumnDef::new(Advertisers::Phone).string().not_null())
                    .col(ColumnDef::new(Advertisers::Email).string().not_null())
                    .col(ColumnDef::new(Advertisers::Document).string())
                    .col(ColumnDef::new(Advertisers::Address).string())
                    .col(ColumnDef::new(Advertisers::City).string())
                    .col(ColumnDef::new(Advertisers::State).string())
                    .col(ColumnDef::new(Advertisers::PasswordHash).string().not_null())
                    .col(self.create_timestamp_column(manager, Advertisers::CreatedAt))
                    .col(self.create_timestamp_column(manager, Advertisers::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_likes_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(self.create_id_column(manager, Likes::Id).primary_key())
                    .col(ColumnDef::new(Likes::ListingId).string().not_null())
                    .col(ColumnDef::new(Likes::Ip).string().not_null())
                    .col(self.create_timestamp_column(manager, Likes::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_listings_status_created_at")
                    .table(Listings::Table)
                    .col(Listings::Status)
                    .col(Listings::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_listings_advertiser_id")
                    .table(Listings::Table)
                    .col(Listings::AdvertiserId)
                    .to_owned(),
            )
            .await?;

        // One like per (listing, ip)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_likes_listing_id_ip")
                    .table(Likes::Table)
                    .col(Likes::ListingId)
                    .col(Likes::Ip)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Listings {
    Table,
    Id,
    SellerName,
    SellerContact,
    Email,
    Phone,
    PhoneRaw,
    Category,
    BodyManufacturer,
    BodyModel,
    ChassisManufacturer,
    ChassisModel,
    Mileage,
    Seats,
    Color,
    ModelYear,
    Price,
    Description,
    CoverImageUrl,
    CoverImagePublicId,
    CoverThumbUrl,
    Images,
    ImagePublicIds,
    City,
    State,
    Status,
    AdvertiserId,
    SubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Advertisers {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Document,
    Address,
    City,
    State,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    Id,
    ListingId,
    Ip,
    CreatedAt,
}
