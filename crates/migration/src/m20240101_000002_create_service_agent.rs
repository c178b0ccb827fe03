//! Create `service_agent` table.
//!
//! One row per service type; `sequence` doubles as the legacy-migration marker
//! (0 = contexts not yet migrated).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceAgent::Table)
                    .if_not_exists()
                    .col(string_len(ServiceAgent::Id, 1024).primary_key())
                    .col(string_len(ServiceAgent::ServiceType, 128).unique_key().not_null())
                    .col(big_integer(ServiceAgent::Sequence).not_null())
                    .col(timestamp_with_time_zone(ServiceAgent::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceAgent::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceAgent { Table, Id, ServiceType, Sequence, CreatedAt }
