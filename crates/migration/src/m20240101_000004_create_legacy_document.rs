//! Create `legacy_document` table.
//!
//! Documents written by the previous storage layout, where the kind lived in
//! `content.type`. Read-only input for the context migration.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LegacyDocument::Table)
                    .if_not_exists()
                    .col(string_len(LegacyDocument::ConfigId, 1024).not_null())
                    .col(string_len(LegacyDocument::Id, 2048).not_null())
                    .col(json_binary(LegacyDocument::Content).not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_legacy_document")
                            .col(LegacyDocument::ConfigId)
                            .col(LegacyDocument::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_legacy_document_config")
                            .from(LegacyDocument::Table, LegacyDocument::ConfigId)
                            .to(ServiceConfig::Table, ServiceConfig::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(LegacyDocument::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum LegacyDocument { Table, ConfigId, Id, Content }

#[derive(DeriveIden)]
enum ServiceConfig { Table, Id }
