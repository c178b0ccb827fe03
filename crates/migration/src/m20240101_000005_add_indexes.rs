use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // service_config: listed per service type during migration
        manager
            .create_index(
                Index::create()
                    .name("idx_service_config_type")
                    .table(ServiceConfig::Table)
                    .col(ServiceConfig::ServiceType)
                    .to_owned(),
            )
            .await?;

        // service_agent: migration candidates by (sequence, created_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_service_agent_sequence_created")
                    .table(ServiceAgent::Table)
                    .col(ServiceAgent::Sequence)
                    .col(ServiceAgent::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_agent_sequence_created").table(ServiceAgent::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_config_type").table(ServiceConfig::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceConfig { Table, ServiceType }

#[derive(DeriveIden)]
enum ServiceAgent { Table, Sequence, CreatedAt }
