//! Create `document` table.
//!
//! One versioned JSON document per `(config_id, id)`; `doc_type` holds the
//! server-stamped kind and `sequence` the optimistic-concurrency counter.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(string_len(Document::ConfigId, 1024).not_null())
                    .col(string_len(Document::Id, 2048).not_null())
                    .col(string_len(Document::DocType, 64).not_null())
                    .col(json_binary(Document::Content).not_null())
                    .col(big_integer(Document::Sequence).not_null())
                    .col(timestamp_with_time_zone(Document::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Document::UpdatedAt).not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_document")
                            .col(Document::ConfigId)
                            .col(Document::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Document::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Document { Table, ConfigId, Id, DocType, Content, Sequence, CreatedAt, UpdatedAt }
