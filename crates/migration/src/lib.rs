//! Migrator registering table migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_document;
mod m20240101_000002_create_service_agent;
mod m20240101_000003_create_service_config;
mod m20240101_000004_create_legacy_document;
mod m20240101_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_document::Migration),
            Box::new(m20240101_000002_create_service_agent::Migration),
            Box::new(m20240101_000003_create_service_config::Migration),
            Box::new(m20240101_000004_create_legacy_document::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000005_add_indexes::Migration),
        ]
    }
}
