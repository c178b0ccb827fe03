//! Create `service_config` table: service object configs, the scope every
//! document lives under.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceConfig::Table)
                    .if_not_exists()
                    .col(string_len(ServiceConfig::Id, 1024).primary_key())
                    .col(string_len(ServiceConfig::ServiceType, 128).not_null())
                    .col(timestamp_with_time_zone(ServiceConfig::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceConfig::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceConfig { Table, Id, ServiceType, CreatedAt }
